use anyhow::Result;
use donor_directory::config::{BackendKind, TomlConfig};
use donor_directory::core::DocumentStore;
use donor_directory::utils::validation::Validate;
use donor_directory::{
    BloodGroup, DonorDirectory, DonorQuery, LocalPictureStore, MemoryStore, ProfileEdit, Resource,
    UpdateOutcome, UserRecord,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

const SEED: &str = r#"[
  {"userId": "1", "name": "Asha", "bloodGroup": "O+", "fullAddress": "Pune", "email": "asha@mail.org", "phoneNumber": "+91 90000 00001"},
  {"userId": "2", "name": "Ravi", "bloodGroup": "A+", "fullAddress": "Nagpur", "email": "ravi@mail.org", "phoneNumber": "+91 90000 00002"},
  {"userId": "3", "name": "Meera", "bloodGroup": "O+", "fullAddress": "Nashik", "email": "meera@mail.org", "phoneNumber": "+91 90000 00003"},
  {"userId": "4", "name": "Kiran", "bloodGroup": "B−"}
]"#;

async fn local_directory(
    temp_dir: &TempDir,
) -> Result<(
    Arc<MemoryStore>,
    DonorDirectory<MemoryStore, LocalPictureStore>,
)> {
    let records_file = temp_dir.path().join("users.json");
    tokio::fs::write(&records_file, SEED).await?;

    let store = Arc::new(MemoryStore::from_json_file(&records_file).await?);
    let pictures = Arc::new(LocalPictureStore::new(
        temp_dir.path().join("pictures"),
        "ProfilePicture",
    ));
    Ok((store.clone(), DonorDirectory::from_shared(store, pictures)))
}

#[tokio::test]
async fn test_local_config_and_seed_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("donor-directory.toml");
    tokio::fs::write(
        &config_path,
        r#"
[backend]
kind = "local"

[local]
records_file = "users.json"
pictures_dir = "pictures"

[logging]
format = "compact"
"#,
    )
    .await?;

    let config = TomlConfig::from_file(&config_path)?;
    assert_ok!(config.validate());
    assert_eq!(config.backend.kind, BackendKind::Local);

    let (store, _) = local_directory(&temp_dir).await?;
    assert_eq!(store.len().await, 4);
    Ok(())
}

#[tokio::test]
async fn test_grouping_covers_every_record_once() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (_, directory) = local_directory(&temp_dir).await?;

    let buckets = match directory.find_donors("nobody", None).finish().await {
        Resource::Success(DonorQuery::Grouped(buckets)) => buckets,
        other => panic!("unexpected status: {:?}", other),
    };

    assert_eq!(buckets.total(), 4);
    let ids = |group: BloodGroup| -> Vec<String> {
        buckets
            .get(group)
            .iter()
            .map(|r| r.user_id().to_string())
            .collect()
    };
    assert_eq!(ids(BloodGroup::OPositive), vec!["1", "3"]);
    assert_eq!(ids(BloodGroup::APositive), vec!["2"]);
    assert_eq!(ids(BloodGroup::BNegative), vec!["4"]);
    Ok(())
}

#[tokio::test]
async fn test_requester_is_excluded_from_filtered_query() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (_, directory) = local_directory(&temp_dir).await?;

    match directory
        .find_donors("1", Some(BloodGroup::OPositive))
        .finish()
        .await
    {
        Resource::Success(DonorQuery::Matches(donors)) => {
            let ids: Vec<&str> = donors.iter().map(UserRecord::user_id).collect();
            assert_eq!(ids, vec!["3"]);
        }
        other => panic!("unexpected status: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_update_with_picture_persists_file_and_reference() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (store, directory) = local_directory(&temp_dir).await?;

    let snapshot = match directory.read_user("2").finish().await {
        Resource::Success(Some(record)) => record,
        other => panic!("unexpected status: {:?}", other),
    };
    let mut edit = ProfileEdit::from_record(&snapshot);
    edit.phone_number = "+91 91111 22222".to_string();
    edit.picture = Some(b"\x89PNG fake image".to_vec());

    let outcome = directory.update_profile(snapshot, edit).finish().await;
    assert!(matches!(outcome, Resource::Success(UpdateOutcome::Updated(_))));

    let picture = temp_dir.path().join("pictures/ProfilePicture/2");
    assert_eq!(tokio::fs::read(&picture).await?, b"\x89PNG fake image");

    let stored = store.get("2").await?.expect("record 2 exists");
    assert_eq!(stored.phone_number, "+91 91111 22222");
    assert!(stored
        .profile_picture_url
        .as_deref()
        .is_some_and(|url| url.starts_with("file://")));

    let saved = temp_dir.path().join("saved.json");
    store.save_json_file(&saved).await?;
    let reloaded = MemoryStore::from_json_file(&saved).await?;
    assert_eq!(reloaded.get("2").await?, Some(stored));
    Ok(())
}

#[tokio::test]
async fn test_unchanged_update_is_reported_without_write() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (store, directory) = local_directory(&temp_dir).await?;
    let before = store.get("3").await?.expect("record 3 exists");

    let outcome = directory
        .update_profile(before.clone(), ProfileEdit::from_record(&before))
        .finish()
        .await;

    assert_eq!(outcome, Resource::Success(UpdateOutcome::Unchanged));
    assert_eq!(store.get("3").await?, Some(before));
    Ok(())
}

#[tokio::test]
async fn test_seed_with_unknown_blood_group_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let records_file = temp_dir.path().join("bad.json");
    tokio::fs::write(&records_file, r#"[{"userId": "x", "bloodGroup": "Rh-null"}]"#).await?;

    assert_err!(MemoryStore::from_json_file(&records_file).await);
    Ok(())
}
