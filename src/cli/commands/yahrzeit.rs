use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::utils::{connect, output_value};
use crate::cli::OutputFormat;
use crate::config::CONFIG;
use crate::database::Store;
use crate::types::OrgScope;
use crate::yahrzeit::{self, Occurrence};

#[derive(Args)]
pub struct ScheduleArgs {
    #[arg(long, help = "Organization whose yahrzeits are listed")]
    pub org: Uuid,
    #[arg(long, help = "Window in days (defaults from config)")]
    pub days: Option<i64>,
    #[arg(long, help = "Reference date, YYYY-MM-DD (defaults to today)")]
    pub today: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum YahrzeitCommands {
    #[command(about = "Yahrzeits falling within the next N days, grouped by week and month")]
    Upcoming(ScheduleArgs),

    #[command(about = "Yahrzeits whose reminder is due")]
    Reminders(ScheduleArgs),
}

pub async fn handle(cmd: YahrzeitCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (args, reminders) = match cmd {
        YahrzeitCommands::Upcoming(args) => (args, false),
        YahrzeitCommands::Reminders(args) => (args, true),
    };
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());

    let store = connect().await?;
    let records = store.list_yahrzeits(&OrgScope::Organization(args.org)).await?;

    let occurrences = if reminders {
        let days = args.days.unwrap_or(CONFIG.yahrzeit.reminder_days_before);
        yahrzeit::due_reminders(records, today, days)
    } else {
        let days = args.days.unwrap_or(CONFIG.yahrzeit.upcoming_horizon_days);
        yahrzeit::upcoming(records, today, days)
    };

    let groups = yahrzeit::group_by_bucket(occurrences);
    output_value(&output_format, &groups, |groups| {
        if groups.is_empty() {
            println!("No yahrzeits in range");
        }
        for group in groups {
            println!("{}", group.label);
            for occ in &group.items {
                println!("  {}", line(occ));
            }
        }
    })
}

fn line(occ: &Occurrence) -> String {
    format!(
        "{}  {} {} {}  {} (in {} days)",
        occ.date,
        occ.hebrew_date.day,
        occ.hebrew_date.month_name(),
        occ.hebrew_date.year,
        occ.yahrzeit.deceased_name,
        occ.days_until
    )
}
