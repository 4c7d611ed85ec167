use crate::application::builder::{CardDetails, CardToken, Charge, OperationCall, Refund, RequestBuilder};
use crate::application::iframe::IframeRequest;
use crate::config::GatewayConfig;
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Offline request tooling for the PayTPV gateway", long_about = None)]
pub struct Cli {
    /// JSON configuration file. Without it, MERCHANTCODE, MERCHANTPASSWORD and
    /// MERCHANTTERMINAL are read from the environment.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// IP address of the customer the request is made for.
    #[arg(long, global = true, default_value = "127.0.0.1")]
    pub ip: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build and sign a request and print it as JSON. Nothing is sent.
    #[command(subcommand)]
    Request(RequestCommand),
    /// Print the hosted payment page iframe for a stored card.
    Iframe(IframeArgs),
}

#[derive(Subcommand)]
pub enum RequestCommand {
    /// Tokenize a card.
    AddUser(CardArgs),
    /// Fetch stored card metadata.
    InfoUser(TokenArgs),
    /// Delete a stored card.
    RemoveUser(TokenArgs),
    /// Charge a stored card.
    Purchase(PurchaseArgs),
    /// Refund a previous charge.
    Refund(RefundArgs),
}

#[derive(Args)]
pub struct CardArgs {
    /// Card number, digits only.
    #[arg(long)]
    pub pan: String,
    /// Expiry date as mmyy.
    #[arg(long)]
    pub expiry_date: String,
    #[arg(long)]
    pub cvv: String,
    #[arg(long)]
    pub name: String,
}

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long)]
    pub user_id: String,
    #[arg(long)]
    pub user_token: String,
}

#[derive(Args)]
pub struct PurchaseArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Amount in euros, e.g. 33 or 12.50.
    #[arg(long)]
    pub amount: Decimal,
    #[arg(long)]
    pub order: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value_t = 0)]
    pub scoring: u32,
}

#[derive(Args)]
pub struct RefundArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[arg(long)]
    pub amount: Decimal,
    #[arg(long)]
    pub order: String,
    #[arg(long)]
    pub auth_code: String,
}

#[derive(Args)]
pub struct IframeArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    #[arg(long)]
    pub amount: Decimal,
    #[arg(long)]
    pub order: String,
    #[arg(long, default_value = "ES")]
    pub language: String,
    #[arg(long)]
    pub url_ok: String,
    #[arg(long)]
    pub url_ko: String,
}

impl From<TokenArgs> for CardToken {
    fn from(args: TokenArgs) -> Self {
        CardToken::new(args.user_id, args.user_token)
    }
}

impl From<RequestCommand> for OperationCall {
    fn from(command: RequestCommand) -> Self {
        match command {
            RequestCommand::AddUser(card) => OperationCall::AddUser(CardDetails {
                pan: card.pan,
                expiry_date: card.expiry_date,
                cvv: card.cvv,
                cardholder_name: card.name,
            }),
            RequestCommand::InfoUser(token) => OperationCall::InfoUser(token.into()),
            RequestCommand::RemoveUser(token) => OperationCall::RemoveUser(token.into()),
            RequestCommand::Purchase(args) => OperationCall::ExecutePurchase(
                Charge::new(args.token.into(), args.amount, args.order)
                    .with_description(args.description)
                    .with_scoring(args.scoring),
            ),
            RequestCommand::Refund(args) => OperationCall::ExecuteRefund(Refund::new(
                args.token.into(),
                args.amount,
                args.order,
                args.auth_code,
            )),
        }
    }
}

impl From<IframeArgs> for IframeRequest {
    fn from(args: IframeArgs) -> Self {
        IframeRequest {
            card: args.token.into(),
            amount: args.amount,
            order: args.order,
            language: args.language,
            url_ok: args.url_ok,
            url_ko: args.url_ko,
        }
    }
}

/// Executes a parsed command line, writing the result to `out`.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let config = match &cli.config {
        Some(path) => GatewayConfig::from_json_file(path)?,
        None => GatewayConfig::from_env()?,
    };
    let builder = RequestBuilder::from_config(&config, cli.ip);

    match cli.command {
        Command::Request(command) => {
            let request = builder.build(&command.into())?;
            serde_json::to_writer_pretty(&mut *out, &request)?;
            writeln!(out)?;
        }
        Command::Iframe(args) => {
            let html = builder.secure_iframe(&args.into())?;
            writeln!(out, "{html}")?;
        }
    }
    Ok(())
}
