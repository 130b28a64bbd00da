use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use magnetcraft_admin::{
    admin::{AdminShell, OrderRow, UserRow},
    config::{self, ClientConfig},
    controller::{EmailForm, GenerateForm, ReportController, ReportViewState},
    models::{OperationResult, Report},
    transport::HttpReportClient,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(&cli)?;

    match cli.command {
        Commands::Reports(command) => handle_reports_command(&context, command, cli.json).await?,
        Commands::Overview => handle_overview(&context, cli.json).await?,
        Commands::Users => handle_users(&context, cli.json).await?,
        Commands::Orders => handle_orders(&context, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "magnetcraft-admin",
    about = "MagnetCraft admin client for reports, users and orders",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[arg(long, global = true, help = "Override the configured API base URL")]
    api_url: Option<String>,
    #[arg(long, global = true, help = "Override the configured download directory")]
    download_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Reports(ReportsCommands),
    /// Dashboard headline numbers
    Overview,
    Users,
    Orders,
}

#[derive(Subcommand)]
enum ReportsCommands {
    List(ListReportsArgs),
    Generate(GenerateReportArgs),
    DownloadPdf(DownloadReportArgs),
    DownloadChart(DownloadChartArgs),
    Email(EmailReportArgs),
}

#[derive(Args)]
struct ListReportsArgs {
    #[arg(long, default_value_t = 1, help = "Page to fetch (1-based)")]
    page: u32,
    #[arg(long, help = "Reports per page; defaults to the configured page size")]
    per_page: Option<u32>,
}

#[derive(Args)]
struct GenerateReportArgs {
    #[arg(long, help = "Name of the report")]
    name: String,
    #[arg(long, help = "Start of the covered period (YYYY-MM-DD)")]
    start: Option<String>,
    #[arg(long, help = "End of the covered period (YYYY-MM-DD)")]
    end: Option<String>,
}

#[derive(Args)]
struct DownloadReportArgs {
    #[arg(long, help = "Report identifier")]
    id: i64,
    #[arg(long, help = "Report name used in the saved filename")]
    name: String,
}

#[derive(Args)]
struct DownloadChartArgs {
    #[arg(long, help = "Report identifier")]
    id: i64,
    #[arg(long, help = "Chart kind, e.g. revenue or products")]
    chart_type: String,
    #[arg(long, help = "Report name used in the saved filename")]
    name: String,
}

#[derive(Args)]
struct EmailReportArgs {
    #[arg(long, help = "Report identifier")]
    id: i64,
    #[arg(long, default_value = "", help = "Report name shown in the confirmation")]
    name: String,
    #[arg(long, help = "Recipient email address")]
    to: String,
    #[arg(long, help = "Sender email address; the backend default is used when omitted")]
    from: Option<String>,
}

struct CliContext {
    config: ClientConfig,
    client: Arc<HttpReportClient>,
}

impl CliContext {
    fn initialize(cli: &Cli) -> Result<Self> {
        let loaded = config::load_config();
        let (level, json) = config::log_settings(&loaded);
        config::init_tracing(level, json);

        let mut config = loaded
            .map_err(|e| {
                error!("Client configuration rejected: {}", e);
                e
            })
            .context("failed to load client config")?;
        info!(
            environment = %config.environment,
            api_base_url = %config.api_base_url,
            "Configuration loaded"
        );

        if let Some(api_url) = &cli.api_url {
            config.api_base_url = api_url.clone();
        }
        if let Some(dir) = &cli.download_dir {
            config.download_dir = dir.clone();
        }

        Self::from_config(config)
    }

    fn from_config(config: ClientConfig) -> Result<Self> {
        let client = HttpReportClient::new(&config).context("failed to build HTTP client")?;
        debug!(target: "magnetcraft_cli", base_url = %client.base_url(), "client ready");

        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    fn report_controller(&self, per_page: Option<u32>) -> ReportController<HttpReportClient> {
        ReportController::new(
            self.client.clone(),
            per_page.unwrap_or(self.config.default_per_page),
        )
    }
}

async fn handle_reports_command(
    context: &CliContext,
    command: ReportsCommands,
    json: bool,
) -> Result<()> {
    match command {
        ReportsCommands::List(args) => {
            let controller = context.report_controller(args.per_page);
            let result = if args.page > 1 {
                controller.set_page(args.page).await.unwrap_or_else(|| {
                    OperationResult::failure(format!("Invalid page {}", args.page), None)
                })
            } else {
                controller.load_reports().await
            };
            let view = controller.snapshot().await;
            if json {
                print_json(&view)?;
            } else {
                render_report_page(&view);
            }
            ensure_success(&result)
        }
        ReportsCommands::Generate(args) => {
            let controller = context.report_controller(None);
            controller.open_generate_dialog().await;
            controller
                .update_generate_form(GenerateForm {
                    report_name: args.name,
                    start_date: args.start.unwrap_or_default(),
                    end_date: args.end.unwrap_or_default(),
                })
                .await;
            let result = controller.submit_generate().await;
            if json {
                print_json(&result)?;
            } else {
                render_banner(&controller.snapshot().await);
                if let Some(report) = &result.data {
                    render_report(report);
                }
            }
            ensure_success(&result)
        }
        ReportsCommands::DownloadPdf(args) => {
            let controller = context.report_controller(None);
            let result = controller.download_pdf(args.id, &args.name).await;
            emit_artifact_result(&controller, &result, json).await
        }
        ReportsCommands::DownloadChart(args) => {
            let controller = context.report_controller(None);
            let result = controller
                .download_chart(args.id, &args.chart_type, &args.name)
                .await;
            emit_artifact_result(&controller, &result, json).await
        }
        ReportsCommands::Email(args) => {
            let controller = context.report_controller(None);
            controller.open_email_dialog(args.id, args.name).await;
            controller
                .update_email_form(EmailForm {
                    recipient_email: args.to,
                    sender_email: args.from.unwrap_or_default(),
                })
                .await;
            let result = controller.submit_email().await;
            if json {
                print_json(&result)?;
            } else {
                render_banner(&controller.snapshot().await);
            }
            ensure_success(&result)
        }
    }
}

async fn load_shell(context: &CliContext) -> AdminShell<HttpReportClient> {
    AdminShell::load(context.client.as_ref(), context.report_controller(None)).await
}

async fn handle_overview(context: &CliContext, json: bool) -> Result<()> {
    let shell = load_shell(context).await;
    let errors = shell.load_errors();
    if !errors.is_empty() {
        bail!("{}", errors.join("; "));
    }
    let metrics = shell.overview();
    if json {
        print_json(&metrics)?;
    } else {
        println!("Users:            {}", metrics.total_users);
        println!("Orders:           {}", metrics.total_orders);
        println!("Revenue:          ${:.2}", metrics.total_revenue);
        println!("Pending orders:   {}", metrics.pending_orders);
        println!("Completed orders: {}", metrics.completed_orders);
    }
    Ok(())
}

async fn handle_users(context: &CliContext, json: bool) -> Result<()> {
    let shell = load_shell(context).await;
    if let Some(message) = shell.users_error() {
        bail!("{}", message);
    }
    if let Some(message) = shell.orders_error() {
        warn!("Orders unavailable while listing users: {}", message);
    }
    let rows = shell.user_rows();
    if json {
        print_json(&rows)?;
    } else if rows.is_empty() {
        println!("No users found");
    } else {
        rows.iter().for_each(render_user);
    }
    Ok(())
}

async fn handle_orders(context: &CliContext, json: bool) -> Result<()> {
    let shell = load_shell(context).await;
    if let Some(message) = shell.orders_error() {
        bail!("{}", message);
    }
    if let Some(message) = shell.users_error() {
        warn!("Users unavailable while listing orders: {}", message);
    }
    let rows = shell.order_rows();
    if json {
        print_json(&rows)?;
    } else if rows.is_empty() {
        println!("No orders found");
    } else {
        rows.iter().for_each(render_order);
    }
    Ok(())
}

async fn emit_artifact_result<T: Serialize>(
    controller: &ReportController<HttpReportClient>,
    result: &OperationResult<T>,
    json: bool,
) -> Result<()> {
    if json {
        print_json(result)?;
    } else {
        render_banner(&controller.snapshot().await);
    }
    ensure_success(result)
}

fn ensure_success<T>(result: &OperationResult<T>) -> Result<()> {
    if result.success {
        Ok(())
    } else {
        Err(anyhow!(result.message.clone()))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_banner(view: &ReportViewState) {
    if let Some(message) = &view.success {
        println!("{}", message);
    }
    if let Some(message) = &view.error {
        eprintln!("error: {}", message);
    }
}

fn render_report(report: &Report) {
    println!(
        "- Report {} • {} • {} to {} • {} orders • revenue {:.2}",
        report.id,
        report.name,
        report.start_date.as_deref().unwrap_or("-"),
        report.end_date.as_deref().unwrap_or("-"),
        report.total_orders,
        report.total_revenue
    );
}

fn render_report_page(view: &ReportViewState) {
    match &view.pagination {
        Some(p) => println!(
            "Reports page {} of {} ({} total)",
            p.current_page, p.pages, p.total
        ),
        None => println!("Reports page {}", view.current_page),
    }
    if view.reports.is_empty() {
        println!("No reports found");
    }
    for report in &view.reports {
        render_report(report);
    }
    render_banner(view);
}

fn render_user(user: &UserRow) {
    println!(
        "- User {} • {} • {} • {} • joined {}",
        user.id, user.username, user.email, user.role, user.joined
    );
}

fn render_order(order: &OrderRow) {
    println!(
        "- Order {} • user {} • status {} • total {} • placed {}",
        order.id, order.user_id, order.status, order.total, order.placed
    );
}
