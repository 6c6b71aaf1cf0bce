use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use handoff_core::HandoffConfig;
use handoff_parse::{
    dashboard, emr_clean, sort_by_admission, summarize_document, AsyncDispatcher,
    TemplateContext, TemplateEngine,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "handoff_parse=info";

#[derive(Parser, Debug)]
#[command(
    name = "handoff-cli",
    about = "Phân tích bản bàn giao bệnh nhân dạng văn bản tự do."
)]
struct Args {
    /// Đường dẫn tới file bàn giao.
    #[arg(short, long)]
    input: PathBuf,

    /// File JSON cấu hình; trường thiếu lấy giá trị mặc định.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// In bản ghi từng bệnh nhân dạng JSON.
    Records {
        /// Sắp xếp theo ngày nhập viện.
        #[arg(long)]
        sort_by_admission: bool,
        /// Ngày mới nhất trước.
        #[arg(long)]
        descending: bool,
    },
    /// In danh sách vấn đề và kế hoạch.
    Plans,
    /// In bảng theo dõi có mức độ ưu tiên.
    Dashboard,
    /// In văn bản đã bỏ markdown để dán vào EMR.
    Clean,
    /// Điền mẫu ghi chú cho một bệnh nhân.
    Render {
        /// File mẫu chứa các token `{{...}}`.
        #[arg(short, long)]
        template: PathBuf,
        /// Vị trí bệnh nhân trong danh sách bản ghi.
        #[arg(short, long, default_value_t = 0)]
        patient: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let document = read_file(&args.input)?;
    let config = match &args.config {
        Some(path) => HandoffConfig::from_json_str(&read_file(path)?)
            .with_context(|| format!("Cấu hình không hợp lệ trong {path:?}"))?,
        None => HandoffConfig::default(),
    };

    match args.command {
        Command::Records {
            sort_by_admission: sort,
            descending,
        } => {
            let dispatcher = AsyncDispatcher::with_thread_worker(&config);
            let sections = dispatcher
                .parse_async(&document)
                .wait()
                .context("Không nhận được kết quả tách mục")?;
            tracing::info!(sections = sections.len(), "document split");

            let mut records = handoff_parse::record::records_from_sections(&sections, &config);
            if sort {
                sort_by_admission(&mut records, descending);
            }
            print_json(&records)?;
        }
        Command::Plans => {
            let snapshot = summarize_document(&document, &config);
            print_json(&snapshot.plans)?;
        }
        Command::Dashboard => {
            let snapshot = summarize_document(&document, &config);
            print_json(&dashboard(snapshot.patients(), &config))?;
        }
        Command::Clean => println!("{}", emr_clean(&document)),
        Command::Render { template, patient } => {
            let template = read_file(&template)?;
            let snapshot = summarize_document(&document, &config);
            let context = match snapshot.patients().get(patient) {
                Some(record) => TemplateContext::from_record(record),
                None => {
                    tracing::warn!(patient, "no such patient, rendering with defaults");
                    TemplateContext::new()
                }
            };
            println!("{}", TemplateEngine::system(&config).render(&template, &context));
        }
    }

    Ok(())
}

/// `RUST_LOG` wins when set and valid; otherwise log the parser at info.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Không đọc được file {path:?}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Không serialize kết quả")?;
    println!("{json}");
    Ok(())
}
