use clap::Parser;
use donor_directory::config::{BackendKind, CliArgs, Command, MailConfig, TomlConfig};
use donor_directory::core::{DocumentStore, PictureStore};
use donor_directory::utils::error::{DirectoryError, ErrorCategory, ErrorSeverity};
use donor_directory::utils::{logger, validation::Validate};
use donor_directory::{
    DonationRequestService, DonorDirectory, DonorQuery, FirebasePictureStore, FirestoreStore,
    LocalPictureStore, MailNotifier, MemoryStore, ProfileEdit, Resource, UpdateOutcome,
    UserRecord,
};
use std::path::Path;
use std::sync::Arc;

/// Terminal failure of a command, as reported by its status stream.
struct Failure {
    category: ErrorCategory,
    message: String,
}

impl From<DirectoryError> for Failure {
    fn from(e: DirectoryError) -> Self {
        Self {
            category: e.category(),
            message: e.user_friendly_message(),
        }
    }
}

fn settle<T>(status: Resource<T>) -> Result<T, Failure> {
    match status {
        Resource::Success(value) => Ok(value),
        Resource::Error { category, message } => Err(Failure { category, message }),
        Resource::Loading => Err(Failure {
            category: ErrorCategory::Internal,
            message: "request did not finish".to_string(),
        }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(args.verbose || config.verbose(), config.log_format());
    tracing::info!("Starting donor-directory with {:?} backend", config.backend.kind);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let outcome = match config.backend.kind {
        BackendKind::Firestore => {
            let (Some(firestore), Some(storage)) =
                (config.firestore.clone(), config.storage.clone())
            else {
                anyhow::bail!("firestore backend requires [firestore] and [storage] sections");
            };
            let directory = DonorDirectory::new(
                FirestoreStore::new(firestore),
                FirebasePictureStore::new(storage),
            );
            run(&directory, args.command, config.mail.clone()).await
        }
        BackendKind::Local => {
            let Some(local) = config.local.clone() else {
                anyhow::bail!("local backend requires a [local] section");
            };
            let store = if Path::new(&local.records_file).exists() {
                Arc::new(MemoryStore::from_json_file(&local.records_file).await?)
            } else {
                tracing::warn!(
                    "{} not found, starting with an empty directory",
                    local.records_file
                );
                Arc::new(MemoryStore::new())
            };
            let pictures = Arc::new(LocalPictureStore::new(&local.pictures_dir, local.folder()));
            let directory = DonorDirectory::from_shared(store.clone(), pictures);

            let outcome = run(&directory, args.command, config.mail.clone()).await;
            if outcome.is_ok() {
                store.save_json_file(&local.records_file).await?;
            }
            outcome
        }
    };

    if let Err(failure) = outcome {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            failure.message,
            failure.category,
            failure.category.severity()
        );
        eprintln!("❌ {}", failure.message);
        eprintln!("💡 建議: {}", failure.category.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match failure.category.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run<S, P>(
    directory: &DonorDirectory<S, P>,
    command: Command,
    mail: Option<MailConfig>,
) -> Result<(), Failure>
where
    S: DocumentStore + 'static,
    P: PictureStore + 'static,
{
    match command {
        Command::Show { user } => {
            let record = load_user(directory, &user).await?;
            print_record(&record);
        }
        Command::Donors { user, blood_group } => {
            match settle(directory.find_donors(&user, blood_group).finish().await)? {
                DonorQuery::Matches(donors) => {
                    println!("🩸 {} donors found", donors.len());
                    for donor in &donors {
                        print_donor(donor);
                    }
                }
                DonorQuery::Grouped(buckets) => {
                    println!("🩸 {} donors in total", buckets.total());
                    for (group, donors) in buckets.iter() {
                        println!("{} ({})", group, donors.len());
                        for donor in donors {
                            print_donor(donor);
                        }
                    }
                }
            }
        }
        Command::Update {
            user,
            name,
            address,
            email,
            phone,
            picture,
        } => {
            let snapshot = load_user(directory, &user).await?;
            let mut edit = ProfileEdit::from_record(&snapshot);
            if let Some(name) = name {
                edit.name = name;
            }
            if let Some(address) = address {
                edit.full_address = address;
            }
            if let Some(email) = email {
                edit.email = email;
            }
            if let Some(phone) = phone {
                edit.phone_number = phone;
            }
            if let Some(path) = picture {
                edit.picture = Some(tokio::fs::read(&path).await.map_err(DirectoryError::from)?);
            }

            match settle(directory.update_profile(snapshot, edit).finish().await)? {
                UpdateOutcome::Unchanged => println!("ℹ️  Nothing changed, profile left as is"),
                UpdateOutcome::Updated(record) => {
                    println!("✅ Profile updated");
                    print_record(&record);
                }
            }
        }
        Command::Contact { user, donor, note } => {
            let Some(mail) = mail else {
                return Err(DirectoryError::MissingConfigError {
                    field: "mail".to_string(),
                }
                .into());
            };
            let service =
                DonationRequestService::new(directory.store(), Arc::new(MailNotifier::new(mail)));
            let message = service
                .request_donation(&user, &donor, note.as_deref())
                .await?;
            println!("📨 Request sent to {}", message.to.email);
        }
    }

    Ok(())
}

async fn load_user<S, P>(
    directory: &DonorDirectory<S, P>,
    user_id: &str,
) -> Result<UserRecord, Failure>
where
    S: DocumentStore + 'static,
    P: PictureStore + 'static,
{
    settle(directory.read_user(user_id).finish().await)?
        .ok_or_else(|| DirectoryError::retrieval(format!("no user record for {}", user_id)).into())
}

fn print_record(record: &UserRecord) {
    println!("👤 {} ({})", record.name, record.user_id());
    println!("   Blood group: {}", record.blood_group);
    println!("   Address:     {}", record.full_address);
    println!("   Email:       {}", record.email);
    println!("   Phone:       {}", record.phone_number);
    if let Some(url) = &record.profile_picture_url {
        println!("   Picture:     {}", url);
    }
}

fn print_donor(record: &UserRecord) {
    println!(
        "  - {} [{}] {} {}",
        record.name,
        record.user_id(),
        record.phone_number,
        record.full_address
    );
}
