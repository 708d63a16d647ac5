use anyhow::Result;
use doclib::{Credential, Remote};

use super::{format, select};
use crate::config::AppConfig;

/// Show the documents a download run would consider, without fetching them.
pub async fn run(remote: &dyn Remote, config: &AppConfig, credential: &Credential) -> Result<()> {
    let selection = select(remote, config, credential).await?;

    format::print_record_table(&selection.batch);

    if selection.batch.len() < selection.matched {
        println!(
            "(showing {} of {} matching; raise max_files to see more)",
            selection.batch.len(),
            selection.matched
        );
    }

    Ok(())
}
