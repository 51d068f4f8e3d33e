//! # 车牌检测图片接入客户端 — 应用入口
//!
//! 本文件仅负责日志初始化、参数解析与命令分发。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use plate_intake::error::AppError;
use plate_intake::intake::{commands, IntakeSession, NoticeKind};
use plate_intake::settings;

#[derive(Parser, Debug)]
#[command(name = "plate-intake", version, about = "Upload images to a license plate detection service")]
struct Cli {
    /// 检测服务地址，覆盖设置文件中的 endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// JSON 设置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 解码图片并输出尺寸
    Inspect {
        file: PathBuf,
        /// 将展示内容（原图）写入该路径
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 生成上传载荷（最长边受限的 JPEG）
    Prepare {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// 上传到检测服务并保存返回的图片
    Detect {
        file: Option<PathBuf>,
        #[arg(short, long, default_value = "detected.jpg")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = settings::load_config(cli.config.as_deref())?;
    let config = settings::apply_overrides(config, cli.endpoint)?;
    let session = IntakeSession::with_config(config)?;

    let result = match cli.command {
        Command::Inspect { file, output } => commands::inspect_image(&session, &file, output.as_deref())
            .await
            .map(|report| {
                println!(
                    "{} {} {}x{} {} bytes",
                    report.name, report.media_type, report.width, report.height, report.size_bytes
                );
            }),
        Command::Prepare { file, output } => commands::prepare_image(&session, &file, &output)
            .await
            .map(|report| {
                println!(
                    "{} {}x{} {} bytes",
                    output.display(),
                    report.width,
                    report.height,
                    report.size_bytes
                );
            }),
        Command::Detect { file, output } => commands::detect_image(&session, file.as_deref(), &output)
            .await
            .map(|shown| {
                println!("{} {} bytes", output.display(), shown.bytes.len());
            }),
    };

    if let Some(notice) = session.last_notice()? {
        match notice.kind {
            NoticeKind::Prompt => eprintln!("[!] {}", notice.message),
            NoticeKind::Toast => eprintln!("{}", notice.message),
        }
    }

    result
}
