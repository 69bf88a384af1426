use chrono::{Days, Local, NaiveDate};
use std::path::Path;
use tokio::process::Command;

/// `git log` pretty format producing `id|author|date|subject|refs` lines
pub const HISTORY_FORMAT: &str = "%H|%an <%ae>|%ad|%s|%D";

/// Builds the external process that lists a repository's recent commits
///
/// The orchestrator takes care of stdio wiring and process cleanup; an
/// implementation only decides what to run and where.
pub trait HistoryCommand: Send + Sync {
    fn command(&self, repository: &Path) -> Command;
}

/// Read-only `git log` over every ref, bounded by date and count
#[derive(Debug, Clone)]
pub struct GitLogCommand {
    since: String,
    max_commits: usize,
}

impl GitLogCommand {
    /// `since` is an absolute `YYYY-MM-DD` date
    pub fn new(since: impl Into<String>, max_commits: usize) -> Self {
        Self {
            since: since.into(),
            max_commits,
        }
    }

    /// History query covering the last `days_back` days
    pub fn for_days_back(days_back: u32, max_commits: usize) -> Self {
        Self::new(since_date(Local::now().date_naive(), days_back), max_commits)
    }

    pub fn since(&self) -> &str {
        &self.since
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "log".to_string(),
            "--all".to_string(),
            "--no-color".to_string(),
            // Midnight, so the whole first day is included
            format!("--since={} 00:00:00", self.since),
            format!("--max-count={}", self.max_commits),
            "--date=short".to_string(),
            format!("--pretty=format:{}", HISTORY_FORMAT),
        ]
    }
}

impl HistoryCommand for GitLogCommand {
    fn command(&self, repository: &Path) -> Command {
        let mut command = Command::new("git");
        command
            .args(self.args())
            .current_dir(repository)
            // Never block on a pager or credential prompt
            .env("GIT_PAGER", "cat")
            .env("GIT_TERMINAL_PROMPT", "0");
        command
    }
}

/// Earliest date handed to git; commit timestamps start at the Unix epoch
const EARLIEST_SINCE: NaiveDate = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();

/// The calendar date `days_back` days before `today`, as `YYYY-MM-DD`
///
/// Ranges reaching past the Unix epoch are clamped to 1970-01-01.
pub fn since_date(today: NaiveDate, days_back: u32) -> String {
    today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .map_or(EARLIEST_SINCE, |date| date.max(EARLIEST_SINCE))
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(since_date(today, 7), "2024-02-24");
        assert_eq!(since_date(today, 1), "2024-03-01");
    }

    #[test]
    fn test_since_date_huge_range_clamps() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(since_date(today, 200_000_000), "1970-01-01");
        assert_eq!(since_date(today, u32::MAX), "1970-01-01");
        assert_eq!(since_date(today, 20_000), "1970-01-01");
    }

    #[test]
    fn test_args_contain_constraints() {
        let args = GitLogCommand::new("2024-01-01", 25).args();
        assert_eq!(args[0], "log");
        assert!(args.contains(&"--all".to_string()));
        assert!(args.contains(&"--since=2024-01-01 00:00:00".to_string()));
        assert!(args.contains(&"--max-count=25".to_string()));
        assert!(args.contains(&"--date=short".to_string()));
        assert!(args.contains(&"--pretty=format:%H|%an <%ae>|%ad|%s|%D".to_string()));
    }

    #[test]
    fn test_for_days_back_uses_today() {
        let command = GitLogCommand::for_days_back(3, 10);
        let expected = since_date(Local::now().date_naive(), 3);
        assert_eq!(command.since(), expected);
    }

    #[test]
    fn test_command_runs_in_repository() {
        let command = GitLogCommand::new("2024-01-01", 5).command(Path::new("/tmp/repo"));
        let std_command = command.as_std();
        assert_eq!(std_command.get_program(), "git");
        assert_eq!(
            std_command.get_current_dir(),
            Some(Path::new("/tmp/repo"))
        );
    }
}
