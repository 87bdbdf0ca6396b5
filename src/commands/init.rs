use clap::Args;

use sportlib_core::templates::{self, ImportSummary};
use sportlib_core::{Repository, RepositoryError, SportsLibrary, User};

#[derive(Args)]
pub struct InitCommand {
    /// Name of the library's user
    #[arg(long)]
    pub name: Option<String>,

    /// Import the bundled templates again
    #[arg(long)]
    pub reimport: bool,
}

impl InitCommand {
    pub fn run(&self, library: &SportsLibrary) -> Result<(), Box<dyn std::error::Error>> {
        let repo = library.repository();

        match library.first_run() {
            Some(summary) => {
                println!("Initialized library at {}", library.data_dir().display());
                print_summary(&summary);
            }
            None => println!("Library at {}", library.data_dir().display()),
        }

        if self.reimport {
            let summary = templates::import_bundled(repo)?;
            println!("Re-imported templates:");
            print_summary(&summary);
        }

        if let Some(name) = &self.name {
            let user = set_user_name(repo, name)?;
            println!("User: {}", user);
        }

        Ok(())
    }
}

fn print_summary(summary: &ImportSummary) {
    println!("  {} movement types", summary.movement_types);
    println!("  {} training types", summary.training_types);
    println!("  {} running plans", summary.running_plans);
}

/// Renames the existing user or creates the first one.
pub(crate) fn set_user_name(repo: &Repository, name: &str) -> Result<User, RepositoryError> {
    let user = match repo.user()? {
        Some(mut user) => {
            user.name = name.to_string();
            user
        }
        None => User::new(name),
    };
    repo.add(&user)?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_user_name_keeps_single_user() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::open(temp_dir.path().to_path_buf()).unwrap();

        let first = set_user_name(&repo, "Sam").unwrap();
        let second = set_user_name(&repo, "Samantha").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.count("users").unwrap(), 1);
        assert_eq!(repo.user().unwrap().unwrap().name, "Samantha");
    }
}
