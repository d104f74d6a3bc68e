use crate::{
    cli::{Session, TerminalPrompt, spinner},
    error::{Error, Result},
    info,
    spotify::{AuthorizationPrompt, LoginRequest, scopes},
    success,
    types::{ClientIdentity, User},
};

pub async fn login(client_id: Option<String>, client_secret: Option<String>) -> Result<()> {
    let session = Session::from_env();
    let prompt = TerminalPrompt;

    let client = match (client_id, client_secret) {
        (Some(id), Some(secret)) => {
            info!(
                "Authenticating with provided Client ID and secret.\n\
                 Please ensure that the URL below is listed as a valid redirect URI \
                 in your Spotify application:\n\n{}\n",
                session.authorizer.config().redirect_uri
            );
            Some(ClientIdentity::new(id, secret))
        }
        (None, None) => None,
        _ => {
            return Err(Error::InvalidInput(
                "Please provide both the Client ID and secret.".to_string(),
            ));
        }
    };

    let enabled = session
        .authorizer
        .store()
        .load()
        .await?
        .map(|c| c.auth_scopes)
        .unwrap_or_default();

    let groups: Vec<&scopes::ScopeGroup> = scopes::selectable().collect();
    let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
    let checked: Vec<bool> = groups
        .iter()
        .map(|g| enabled.iter().any(|name| name == g.name))
        .collect();

    info!("By default, spotcli will enable reading the playback state.\n");
    let selected = prompt.select_many(
        "Please select which additional features you want to authorize",
        &names,
        &checked,
    )?;
    let requested: Vec<String> = selected.iter().map(|&i| names[i].to_string()).collect();

    let proceed = prompt.confirm(
        &format!(
            "{} features selected. This will overwrite your existing credentials. \
             Proceed with these settings?",
            requested.len()
        ),
        true,
    )?;
    if !proceed {
        return Err(Error::Cancelled);
    }

    session
        .authorizer
        .login(
            &prompt,
            LoginRequest {
                client,
                scopes: requested,
            },
        )
        .await?;

    success!(
        "Credentials saved to {}",
        session.credentials_path.display()
    );
    Ok(())
}

pub async fn status(verbose: bool) -> Result<()> {
    let session = Session::from_env();

    let pb = spinner("Fetching user profile...");
    let response = session.client.get("me").await;
    pb.finish_and_clear();

    let user: User = serde_json::from_value(response?)?;
    info!(
        "Logged in as {}",
        user.display_name.as_deref().unwrap_or(&user.id)
    );
    if verbose {
        info!(
            "Credentials stored in {}",
            session.credentials_path.display()
        );
    }
    Ok(())
}
