// ABOUTME: Implementation of 'keyprobe lookup' command
// ABOUTME: Lists directory records matching a key name

use anyhow::{bail, Context, Result};
use colored::Colorize;

use keyprobe_api::KeyDirectory;

pub async fn run<D>(name: &str, directory: &D) -> Result<()>
where
    D: KeyDirectory + ?Sized,
{
    let records = directory
        .find_by_name(name)
        .await
        .with_context(|| format!("failed to look up {name}"))?;

    if records.is_empty() {
        bail!("no ssh key named {name}");
    }
    if records.len() > 1 {
        println!(
            "{}",
            format!("{} keys share the name {name}", records.len()).yellow()
        );
    }

    for record in &records {
        super::print_record(record);
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyprobe_api::{KeyCreateRequest, MemoryDirectory};
    use keyprobe_ssh::{generate_authorized_key, KeyPolicy};

    #[tokio::test]
    async fn test_lookup_missing_name_fails() {
        let directory = MemoryDirectory::new();
        let err = run("absent", &directory).await.unwrap_err();
        assert!(err.to_string().contains("absent"));
    }

    #[tokio::test]
    async fn test_lookup_existing_name() {
        let directory = MemoryDirectory::new();
        let (_, key) = generate_authorized_key(&KeyPolicy::ed25519()).unwrap();
        directory
            .create(&KeyCreateRequest::new("probe", key.as_str()))
            .await
            .unwrap();

        run("probe", &directory).await.unwrap();
    }
}
