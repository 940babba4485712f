//! ami-rollover: replace the EC2 instances of one image with a new image
//!
//! The replacements are put behind the classic load balancer that serves the
//! old instances, and the old instances are terminated once every
//! replacement passes the health checks.

use ami_rollover::aws::{
    AwsContext, Ec2Client, ElbClient, FromAwsContext, classify_anyhow_error,
    get_current_account_id,
};
use ami_rollover::config::{
    AwsConfig, DeployConfig, ImagePair, OutputConfig, OutputFormat, WaitSettings,
};
use ami_rollover::deploy::{DeployError, DeployPlan, DeployReport, Deployer, StdoutReporter};
use ami_rollover::wait::WaitConfig;
use ami_rollover_common::display_ids;
use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ami-rollover")]
#[command(about = "Blue/green replacement of EC2 instances behind a classic load balancer")]
#[command(version)]
struct Args {
    /// Image id of the instances currently deployed
    old_image: String,

    /// Image id to deploy
    new_image: String,

    /// AWS region (defaults to the SDK provider chain, then us-east-1)
    #[arg(long)]
    region: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Seconds between checks while waiting for launched instances to run
    #[arg(long, default_value_t = WaitSettings::default().running.interval.as_secs())]
    running_interval: u64,

    /// Maximum number of running-state checks
    #[arg(
        long,
        default_value_t = WaitSettings::default().running.max_attempts,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    running_attempts: u32,

    /// Seconds between load balancer health checks
    #[arg(long, default_value_t = WaitSettings::default().health.interval.as_secs())]
    health_interval: u64,

    /// Maximum number of load balancer health checks
    #[arg(
        long,
        default_value_t = WaitSettings::default().health.max_attempts,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    health_attempts: u32,

    /// Find the old instances and their load balancer, print the plan and stop
    #[arg(long)]
    dry_run: bool,

    /// Dry-run plan format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl TryFrom<Args> for DeployConfig {
    type Error = DeployError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        Ok(Self {
            images: ImagePair::new(args.old_image, args.new_image)?,
            aws: AwsConfig {
                region: args.region,
                aws_profile: args.aws_profile,
            },
            waits: WaitSettings {
                running: WaitConfig::new(
                    Duration::from_secs(args.running_interval),
                    args.running_attempts,
                ),
                health: WaitConfig::new(
                    Duration::from_secs(args.health_interval),
                    args.health_attempts,
                ),
            },
            output: OutputConfig {
                dry_run: args.dry_run,
                format: args.format,
                verbose: args.verbose,
            },
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if let Some(hint) = classify_anyhow_error(e).suggestion() {
        let _ = writeln!(stderr, "\n\x1b[36mHint:\x1b[0m {hint}");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

/// Log filter used when `RUST_LOG` is not set
fn default_log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!(
        "{level},aws_config=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,\
         aws_sdk_ec2=warn,aws_sdk_elasticloadbalancing=warn,aws_sdk_sts=warn,hyper=warn"
    ))
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_filter(args.verbose)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = DeployConfig::try_from(args)?;

    if let Some(profile) = &config.aws.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let aws = AwsContext::with_profile(
        config.aws.region.as_deref(),
        config.aws.aws_profile.as_deref(),
    )
    .await;
    info!(region = %aws.region(), "Loaded AWS configuration");

    get_current_account_id(&aws.sts_client()).await?;

    let deployer = Deployer::new(
        Ec2Client::from_context(&aws),
        ElbClient::from_context(&aws),
        config.waits,
        StdoutReporter::new(),
    );

    if config.output.dry_run {
        let plan = deployer.plan(&config.images).await?;
        match config.output.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            OutputFormat::Table => print_plan_table(&plan),
        }
        return Ok(());
    }

    info!(
        old_image = %config.images.old_image(),
        new_image = %config.images.new_image(),
        "Starting deploy"
    );

    let report = deployer.run(&config.images).await?;
    print_summary(&report);

    Ok(())
}

fn print_plan_table(plan: &DeployPlan) {
    println!(
        "Replace {} with {} behind {}\n",
        plan.old_image, plan.new_image, plan.load_balancer
    );
    println!(
        "{:<22} {:<14} {:<16} {:<26} {:<20}",
        "INSTANCE", "TYPE", "KEY", "SUBNET", "SECURITY_GROUPS"
    );
    println!("{}", "-".repeat(100));
    for p in &plan.profiles {
        println!(
            "{:<22} {:<14} {:<16} {:<26} {:<20}",
            p.instance_id,
            p.instance_type,
            p.key_name.as_deref().unwrap_or("-"),
            p.subnet_id,
            p.security_group_ids.join(","),
        );
    }
    println!("\nTotal: {} instances to replace", plan.profiles.len());
}

fn print_summary(report: &DeployReport) {
    println!("\nLoad balancer: {}", report.load_balancer);
    println!("New instances: {}", display_ids(&report.new_instances));
    if report.retired {
        println!(
            "Old instances deregistered and terminated: {}",
            display_ids(&report.old_instances)
        );
    } else {
        println!(
            "Health checks failed; old instances still in service: {}",
            display_ids(&report.old_instances)
        );
        println!("New instances were left running and registered for inspection.");
    }
}
