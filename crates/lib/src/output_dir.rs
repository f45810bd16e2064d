use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// `YYYY-MM-DD-run-N`
pub fn run_directory_name(date: NaiveDate, run: u32) -> String {
    format!("{}-run-{}", date.format("%Y-%m-%d"), run)
}

/// Creates `root/YYYY-MM-DD-run-N` for the smallest `N >= 1` not already
/// taken. Existing directories are never reused.
pub fn create_output_directory(root: &Path, date: NaiveDate) -> io::Result<PathBuf> {
    let mut run = 1;
    loop {
        let candidate = root.join(run_directory_name(date, run));
        match fs::create_dir(&candidate) {
            Ok(()) => {
                info!("Created working directory: {}", candidate.display());
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => run += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_first_run_of_the_day() {
        let root = tempdir().unwrap();
        let dir = create_output_directory(root.path(), may_first()).unwrap();
        assert_eq!(dir, root.path().join("2024-05-01-run-1"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_existing_run_is_not_overwritten() {
        let root = tempdir().unwrap();
        let first = root.path().join("2024-05-01-run-1");
        fs::create_dir(&first).unwrap();
        fs::write(first.join("keep.pdf"), b"old").unwrap();

        let dir = create_output_directory(root.path(), may_first()).unwrap();
        assert_eq!(dir, root.path().join("2024-05-01-run-2"));
        assert_eq!(fs::read(first.join("keep.pdf")).unwrap(), b"old");
    }

    #[test]
    fn test_fills_first_gap() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("2024-05-01-run-1")).unwrap();
        fs::create_dir(root.path().join("2024-05-01-run-2")).unwrap();
        fs::create_dir(root.path().join("2024-05-01-run-4")).unwrap();

        let dir = create_output_directory(root.path(), may_first()).unwrap();
        assert_eq!(dir, root.path().join("2024-05-01-run-3"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let root = tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(create_output_directory(&missing, may_first()).is_err());
    }
}
