use dbx_storage::DropboxScheme;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dbx_cli::init()?;

    let scheme = DropboxScheme::from_env()?;
    println!(
        "dbx-selfcheck: checking scheme {} (prefix={:?})",
        scheme.config().scheme,
        scheme.config().prefix
    );

    let diagnostics = scheme.ensure().await;
    for diagnostic in &diagnostics {
        println!("dbx-selfcheck: {}", diagnostic);
    }

    if diagnostics.iter().any(|d| d.severity.is_error()) {
        anyhow::bail!("{} problem(s) found", diagnostics.len());
    }

    println!("dbx-selfcheck: ok");
    Ok(())
}
