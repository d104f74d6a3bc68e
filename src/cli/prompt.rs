use dialoguer::{Confirm, Input, MultiSelect};
use url::Url;

use crate::{
    error::{Error, Result},
    info,
    spotify::AuthorizationPrompt,
    warning,
};

/// Terminal implementation of the interactive authorization capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    /// Reads one line of free text.
    pub fn text(&self, message: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    /// Multi-select over `items`, returning the chosen positions.
    pub fn select_many(
        &self,
        message: &str,
        items: &[&str],
        checked: &[bool],
    ) -> Result<Vec<usize>> {
        MultiSelect::new()
            .with_prompt(message)
            .items(items)
            .defaults(checked)
            .interact()
            .map_err(prompt_error)
    }
}

impl AuthorizationPrompt for TerminalPrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn authorize(&self, url: &Url) -> Result<Option<String>> {
        if webbrowser::open(url.as_str()).is_err() {
            warning!("Failed to open browser.");
        }
        info!("Go to the following link in your browser:\n\n\t{}\n", url);

        let code = self.text("Enter verification code")?;
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        Ok(Some(code.to_string()))
    }
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::Prompt(e.to_string())
}
