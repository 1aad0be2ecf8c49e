use clap::Parser;

use crate::{cli::data::DataArgs, prelude::*, tables::build_summary_table};

#[derive(Parser)]
pub struct SummaryArgs {
    #[clap(long, env = "YEAR")]
    year: i32,

    #[clap(flatten)]
    data: DataArgs,
}

impl SummaryArgs {
    pub fn run(&self) -> Result {
        let dashboard = self.data.load_dashboard()?;
        println!("{}", build_summary_table(&dashboard, self.year));
        Ok(())
    }
}
