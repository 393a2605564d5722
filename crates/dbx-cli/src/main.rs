//! Print the external URL of each file given on the command line.
//!
//! Arguments may be full URIs (`dropbox://docs/a.pdf`) or paths relative
//! to the configured scheme.

use dbx_storage::DropboxScheme;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dbx_cli::init()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        anyhow::bail!("usage: dbx-resolve <uri-or-path>...");
    }

    let scheme = DropboxScheme::from_env()?;
    info!(
        "Resolving {} path(s) for scheme {} (public={})",
        args.len(),
        scheme.config().scheme,
        scheme.config().public
    );

    for arg in &args {
        let uri = if arg.contains("://") {
            arg.clone()
        } else {
            scheme.uri(arg)
        };
        println!("{}\t{}", uri, scheme.external_url(&uri).await);
    }

    Ok(())
}
