//! Launchers that present the authorize URL to the user.

// self
use crate::{_prelude::*, error::WebFlowError};

/// Opens the authorize URL for the user.
///
/// Closures `Fn(&Url) -> Result<(), WebFlowError>` implement the trait, which lets tests drive
/// the callback themselves.
pub trait BrowserLauncher
where
	Self: Send + Sync,
{
	/// Presents `url`; returning an error aborts the web grant.
	fn open(&self, url: &Url) -> Result<(), WebFlowError>;
}
impl<F> BrowserLauncher for F
where
	F: Send + Sync + Fn(&Url) -> Result<(), WebFlowError>,
{
	fn open(&self, url: &Url) -> Result<(), WebFlowError> {
		self(url)
	}
}

/// Opens the URL with the operating system's default browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBrowser;
impl BrowserLauncher for SystemBrowser {
	fn open(&self, url: &Url) -> Result<(), WebFlowError> {
		tracing::info!(%url, "Opening the authorization page in the default browser.");

		open::that(url.as_str()).map_err(|source| WebFlowError::Browser { source })
	}
}

/// Prints the URL on standard error for the user to open manually.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrintUrl;
impl BrowserLauncher for PrintUrl {
	fn open(&self, url: &Url) -> Result<(), WebFlowError> {
		tracing::info!(%url, "Waiting for the user to open the authorization page.");
		eprintln!("Open the following URL in a browser to authorize access:\n{url}");

		Ok(())
	}
}
