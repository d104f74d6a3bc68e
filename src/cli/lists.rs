use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use tabled::Table;

use crate::{
    cli::{Session, TerminalPrompt, spinner},
    error::Result,
    info,
    spotify::{
        AuthorizationPrompt, BatchExecutor, BatchRequest, Pager, Remediation, ScopeId,
    },
    success,
    types::{Playlist, PlaylistTableRow},
    utils::{self, ListAction},
    warning,
};

const PLAYLISTS_ENDPOINT: &str = "me/playlists";

pub async fn lists(limit: u32, raw: bool) -> Result<()> {
    let session = Session::from_env();

    if raw {
        let pager = Pager::<Value>::new(&session.client, PLAYLISTS_ENDPOINT, limit).await?;
        let content = pager.content().await?;
        println!("{}", serde_json::to_string(&content)?);
        return Ok(());
    }

    let prompt = TerminalPrompt;
    let pb = spinner("Fetching playlists...");
    let pager = Pager::<Playlist>::new(&session.client, PLAYLISTS_ENDPOINT, limit).await;
    pb.finish_and_clear();
    let mut pager = pager?;

    info!("Your Playlists");
    let mut print_table = true;

    loop {
        if pager.items().is_empty() {
            warning!("No data available for your search query.");
            return Ok(());
        }

        if print_table {
            print_playlists(pager.offset(), pager.items());
        }
        // only re-print after something changed
        print_table = false;

        let input = prompt.text("\nActions:\n[n]ext/[b]ack\n[p]lay/[s]ave #[,...]\n[Ctrl+C] exit\n")?;
        let action = match utils::parse_list_action(&input) {
            Ok(action) => action,
            Err(e) if e.is_recoverable() => {
                warning!("{}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        match action {
            ListAction::Next => match pager.next().await? {
                Ok(_) => print_table = true,
                Err(boundary) => info!("{}", boundary),
            },
            ListAction::Back => match pager.previous().await? {
                Ok(_) => print_table = true,
                Err(boundary) => info!("{}", boundary),
            },
            ListAction::Play(indices) => {
                let Some(selected) = select(pager.offset(), pager.items(), &indices) else {
                    warning!("{}", utils::INPUT_FORMAT_HINT);
                    continue;
                };
                let (number, playlist) = &selected[0];
                if prompt.confirm(&format!("Play the selected playlist? ({number})"), true)? {
                    play(&session, &prompt, playlist).await;
                }
                print_table = true;
                if !prompt.confirm("Continue searching?", true)? {
                    return Ok(());
                }
            }
            ListAction::Save(indices) => {
                let Some(selected) = select(pager.offset(), pager.items(), &indices) else {
                    warning!("{}", utils::INPUT_FORMAT_HINT);
                    continue;
                };
                let numbers: Vec<String> = selected.iter().map(|(n, _)| n.to_string()).collect();
                if prompt.confirm(
                    &format!("Save the selected playlist/s? ({})", numbers.join(",")),
                    true,
                )? {
                    let playlists: Vec<Playlist> = selected.into_iter().map(|(_, p)| p).collect();
                    save(&session, &prompt, &playlists).await;
                }
                print_table = true;
                if !prompt.confirm("Continue searching?", true)? {
                    return Ok(());
                }
            }
        }
    }
}

fn print_playlists(offset: u32, items: &[Playlist]) {
    let rows: Vec<PlaylistTableRow> = items
        .iter()
        .zip(offset + 1..)
        .map(|(p, index)| PlaylistTableRow {
            index,
            name: utils::cut_string(&p.name, 50),
            owner: utils::cut_string(p.owner.display_name.as_deref().unwrap_or(&p.owner.id), 30),
            tracks: p.tracks.total,
        })
        .collect();
    println!("\n{}", Table::new(rows));
}

/// Maps 1-based overall numbers onto playlists of the current page, keeping
/// each number next to the playlist it resolved to. Off-page numbers are dropped.
fn select(offset: u32, items: &[Playlist], indices: &[u32]) -> Option<Vec<(u32, Playlist)>> {
    let selected: Vec<(u32, Playlist)> = indices
        .iter()
        .filter_map(|&number| {
            let position = number.checked_sub(offset + 1)?;
            items
                .get(position as usize)
                .map(|playlist| (number, playlist.clone()))
        })
        .collect();
    if selected.is_empty() { None } else { Some(selected) }
}

async fn play(session: &Session, prompt: &TerminalPrompt, playlist: &Playlist) {
    let request = BatchRequest::new(Method::PUT, "me/player/play")
        .with_body(json!({ "context_uri": playlist.uri }))
        .on_status(
            StatusCode::FORBIDDEN,
            Remediation::RequireScope(ScopeId::new("modify-playback")),
        );

    let outcome = BatchExecutor::new(&session.client, &session.authorizer, prompt)
        .execute(vec![request])
        .await;
    match outcome.failures().next() {
        None => success!("Now playing: {}", playlist.name),
        Some((_, e)) => warning!("Could not play {}: {}", playlist.name, e),
    }
}

async fn save(session: &Session, prompt: &TerminalPrompt, selected: &[Playlist]) {
    let requests: Vec<BatchRequest> = selected
        .iter()
        .map(|p| {
            BatchRequest::new(Method::PUT, format!("playlists/{}/followers", p.id))
                .with_body(json!({ "public": true }))
                .on_status(
                    StatusCode::FORBIDDEN,
                    Remediation::RequireScope(ScopeId::new("user-modify")),
                )
        })
        .collect();

    let outcome = BatchExecutor::new(&session.client, &session.authorizer, prompt)
        .execute(requests)
        .await;

    for (index, e) in outcome.failures() {
        warning!("Could not save {}: {}", selected[index].name, e);
    }
    success!(
        "{} of {} playlists saved.",
        outcome.succeeded(),
        outcome.len()
    );
}
