// ==========================================
// BrightEat 团餐拼单系统 - 命令行参数
// ==========================================

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brighteat")]
#[command(version, about = "BrightEat group food ordering", long_about = None)]
pub struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "BRIGHTEAT_DB")]
    pub db: Option<String>,

    /// Output language (en, zh-CN); defaults to the stored `locale` setting
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the schema (idempotent)
    InitDb,
    /// Insert demo users, the Balbaa menu and fee presets (idempotent)
    SeedData,
    /// Provision accounts from e-mail addresses
    CreateUsers(CreateUsersArgs),
    /// List users ordered by username
    ListUsers,
    /// Generate new passwords for every user
    RegeneratePasswords {
        /// Write the new credentials to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Open a new collection order
    CreateOrder(CreateOrderArgs),
    /// Add an item to an open order
    AddItem(AddItemArgs),
    /// OPEN -> LOCKED
    Lock(TransitionArgs),
    /// LOCKED -> ORDERED, computes every participant's share
    MarkOrdered(TransitionArgs),
    /// ORDERED -> CLOSED
    Close(TransitionArgs),
    /// Print an order summary with the share message
    Summary {
        #[arg(long)]
        code: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a participant's payment as paid
    MarkPaid(MarkPaidArgs),
    /// Print the audit trail of an order
    AuditLog {
        #[arg(long)]
        code: String,
    },
    /// Post a recommendation, optionally about a restaurant
    Recommend {
        /// Author username
        #[arg(long)]
        user: String,

        /// Restaurant name or id
        #[arg(long)]
        restaurant: Option<String>,

        #[arg(long)]
        text: String,
    },
    /// List recommendations, newest first
    Recommendations {
        /// Only recommendations for this restaurant (name or id)
        #[arg(long)]
        restaurant: Option<String>,
    },
    /// Read or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
pub struct CreateUsersArgs {
    /// Comma-separated e-mail addresses
    #[arg(long, value_delimiter = ',')]
    pub emails: Vec<String>,

    /// File with one e-mail address per line
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RoleArg::User)]
    pub role: RoleArg,

    /// Write the generated credentials to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Args)]
pub struct CreateOrderArgs {
    /// Restaurant name or id
    #[arg(long)]
    pub restaurant: String,

    /// Collector username
    #[arg(long)]
    pub collector: String,

    /// Fee preset name; mutually exclusive with explicit fees
    #[arg(long, conflicts_with_all = ["delivery_fee", "tip", "service_fee"])]
    pub preset: Option<String>,

    #[arg(long)]
    pub delivery_fee: Option<Decimal>,

    #[arg(long)]
    pub tip: Option<Decimal>,

    #[arg(long)]
    pub service_fee: Option<Decimal>,

    #[arg(long, value_enum)]
    pub rule: Option<RuleArg>,

    /// Only the collector and assigned users may add items
    #[arg(long)]
    pub private: bool,

    /// Comma-separated usernames
    #[arg(long, value_delimiter = ',')]
    pub assign: Vec<String>,

    /// Cutoff time, "YYYY-MM-DD HH:MM"
    #[arg(long)]
    pub cutoff: Option<String>,

    #[arg(long)]
    pub instapay: Option<String>,
}

#[derive(Args)]
pub struct AddItemArgs {
    #[arg(long)]
    pub code: String,

    /// Username of the participant
    #[arg(long)]
    pub user: String,

    /// Menu item name (from the order's restaurant)
    #[arg(long)]
    pub menu_item: Option<String>,

    #[arg(long)]
    pub custom_name: Option<String>,

    #[arg(long)]
    pub custom_price: Option<Decimal>,

    #[arg(long, default_value_t = 1)]
    pub qty: i32,
}

#[derive(Args)]
pub struct TransitionArgs {
    #[arg(long)]
    pub code: String,

    /// Username performing the transition
    #[arg(long)]
    pub actor: String,
}

#[derive(Args)]
pub struct MarkPaidArgs {
    #[arg(long)]
    pub code: String,

    /// Username of the payer
    #[arg(long)]
    pub user: String,

    /// Username confirming the payment; defaults to the payer
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print every setting with its effective value
    List,
    Get { key: String },
    Set { key: String, value: String },
    /// Remove a stored value so the default applies again
    Unset { key: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RoleArg {
    User,
    Manager,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RuleArg {
    Equal,
    Weighted,
}
