use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chartlink")]
#[command(about = "Chartlink CLI: backend-services access to a FHIR patient record")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML config file (defaults to ./chartlink.toml when present)
    #[arg(short, long, global = true, env = "CHARTLINK_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire an access token and show its type, scopes and expiry
    Token(TokenArgs),
    /// Fetch a resource or run a search (e.g. Observation --patient 123)
    Get(GetArgs),
    /// Search patients across the whole server
    SearchPatients(SearchPatientsArgs),
    /// Build the consolidated record for one patient
    Record(RecordArgs),
}

#[derive(clap::Args, Debug)]
pub struct TokenArgs {
    /// Scope to request; repeat for several (defaults to the configured scopes)
    #[arg(long = "scope")]
    pub scopes: Vec<String>,
    /// Skip the cache and always call the token endpoint
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Resource type (e.g. Patient)
    pub resource_type: String,
    /// Logical id; omit to search
    pub id: Option<String>,
    /// Restrict a search to this patient
    #[arg(long)]
    pub patient: Option<String>,
    /// Search parameter as key=value; repeat for several
    #[arg(short = 'q', long = "param")]
    pub params: Vec<String>,
}

#[derive(clap::Args, Debug, Default)]
pub struct SearchPatientsArgs {
    #[arg(long)]
    pub family: Option<String>,
    #[arg(long)]
    pub given: Option<String>,
    /// Birth date as YYYY-MM-DD
    #[arg(long)]
    pub birthdate: Option<String>,
    #[arg(long)]
    pub identifier: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RecordArgs {
    /// Patient logical id
    pub patient_id: String,
    /// Abandon the whole aggregation after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}
