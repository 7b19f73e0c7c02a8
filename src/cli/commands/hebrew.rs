use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use crate::cli::utils::output_value;
use crate::cli::OutputFormat;
use crate::yahrzeit::{self, HebrewDate};

#[derive(Args)]
pub struct HebrewArgs {
    #[arg(help = "Civil date, YYYY-MM-DD")]
    pub date: NaiveDate,
}

#[derive(Serialize)]
struct Converted {
    gregorian: NaiveDate,
    hebrew: HebrewDate,
    month_name: &'static str,
}

pub fn handle(args: HebrewArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let hebrew = yahrzeit::to_hebrew(args.date);
    let converted = Converted { gregorian: args.date, hebrew, month_name: hebrew.month_name() };
    output_value(&output_format, &converted, |c| {
        println!("{} = {} {} {}", c.gregorian, c.hebrew.day, c.month_name, c.hebrew.year);
    })
}
