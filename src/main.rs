use anyhow::Context;
use campus_timetable::app::pipelines::{ClassPipeline, ExamCalendarPipeline, SeatingFiles, SeatingPipeline};
use campus_timetable::config::cli::{ClassArgs, ExamCalendarArgs, SeatingArgs, ServeArgs};
use campus_timetable::config::{Cli, Command, ScheduleConfig, ServerConfig};
use campus_timetable::core::exam_calendar::{self, CalendarParams};
use campus_timetable::core::exam_seating::SeatingParams;
use campus_timetable::ingest::calendar_inputs::CALENDAR_FILES;
use campus_timetable::utils::error::{ErrorSeverity, Result, TimetableError};
use campus_timetable::utils::{logger, validation::Validate};
use campus_timetable::{GenerationEngine, LocalStorage, Storage};
use clap::Parser;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // serve 的設定檔也可以指定 JSON 日誌，所以先載入
    let server_config = match &cli.command {
        Command::Serve(args) => Some(load_server_config(args)?),
        _ => None,
    };
    let json_logs = cli.json_logs || server_config.as_ref().is_some_and(|c| c.logging.json);

    // 初始化日誌
    if json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting campus-timetable");
    if cli.verbose {
        tracing::debug!("CLI arguments: {:?}", cli);
    }
    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let outcome = match (cli.command, server_config) {
        (Command::Serve(_), Some(config)) => campus_timetable::web::serve(config, cli.monitor).await,
        (Command::Serve(_), None) => Ok(()),
        (Command::Class(args), _) => run_class(args, cli.monitor).await,
        (Command::ExamCalendar(args), _) => run_exam_calendar(args, cli.monitor).await,
        (Command::Seating(args), _) => run_seating(args, cli.monitor).await,
    };

    if let Err(e) = outcome {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 重試錯誤
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

/// Startup problems with the server file are fatal and reported as is.
fn load_server_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("cannot load server config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    config.validate().context("invalid server config")?;
    Ok(config)
}

async fn run_class(args: ClassArgs, monitor: bool) -> Result<()> {
    let mut config = ScheduleConfig::load(&args.schedule_config).await?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let pipeline = ClassPipeline::new(
        LocalStorage::new(&args.inputs),
        LocalStorage::new(&args.outputs),
        config,
    );
    let report = GenerationEngine::new_with_monitoring(pipeline, monitor).run().await?;
    let timetable = &report.output;

    println!("✅ Class timetables generated in {:?}", report.elapsed);
    println!("📊 {} sections, {} unscheduled courses", timetable.sections.len(), timetable.unscheduled.len());
    println!("📁 Output saved to: {}", report.location);
    Ok(())
}

async fn run_exam_calendar(args: ExamCalendarArgs, monitor: bool) -> Result<()> {
    let allocation_json: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&args.allocation).await?)?;
    let params = CalendarParams {
        start_date: args.start,
        end_date: args.end,
        max_credits_per_day: args.max_credits,
        allocation: exam_calendar::parse_allocation(&allocation_json)?,
        holidays: args.holidays,
        default_seats_per_room: args.seats_per_room,
    };
    params.validate()?;

    // 產生器在同一個工作目錄讀寫，先把輸入複製過去
    let inputs = LocalStorage::new(&args.inputs);
    let workdir = LocalStorage::new(&args.outputs);
    for (_, file) in CALENDAR_FILES {
        if inputs.exists(file).await {
            workdir.write_file(file, &inputs.read_file(file).await?).await?;
        }
    }

    let pipeline = ExamCalendarPipeline::new(workdir, params);
    let report = GenerationEngine::new_with_monitoring(pipeline, monitor).run().await?;
    let calendar = &report.output;

    println!("✅ Exam calendar generated in {:?}", report.elapsed);
    println!(
        "📊 {} exam days, {} room assignments, {} unplaced batches",
        calendar.days.len(),
        calendar.rooms.len(),
        calendar.unplaced.len()
    );
    for warning in &calendar.warnings {
        println!("⚠️ {}", warning);
    }
    println!("📁 Output saved to: {}", report.location);
    Ok(())
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| TimetableError::MissingInputError {
            file: path.display().to_string(),
        })
}

async fn copy_into(workdir: &LocalStorage, source: &Path, name: &str) -> Result<()> {
    let data = tokio::fs::read(source).await.map_err(|_| TimetableError::MissingInputError {
        file: source.display().to_string(),
    })?;
    workdir.write_file(name, &data).await
}

async fn run_seating(args: SeatingArgs, monitor: bool) -> Result<()> {
    let workdir = LocalStorage::new(&args.outputs);

    let mut files = SeatingFiles::default();
    for (index, roster) in args.courses.iter().enumerate() {
        // 年級由順序決定；加上前綴避免同名檔案互相覆蓋
        let name = format!("year{}_{}", index + 1, file_name_of(roster)?);
        copy_into(&workdir, roster, &name).await?;
        files.courses.push(name);
    }
    files.rooms = format!("rooms_{}", file_name_of(&args.rooms)?);
    copy_into(&workdir, &args.rooms, &files.rooms).await?;
    files.faculty = format!("faculty_{}", file_name_of(&args.faculty)?);
    copy_into(&workdir, &args.faculty, &files.faculty).await?;

    let params = SeatingParams::new(args.start_date, args.courses_per_room);
    params.validate()?;

    let pipeline = SeatingPipeline::new(workdir, files, params);
    let report = GenerationEngine::new_with_monitoring(pipeline, monitor).run().await?;
    let plan = &report.output;

    println!("✅ Exam seating generated in {:?}", report.elapsed);
    println!(
        "📊 {} seating rows, {} unscheduled courses",
        plan.rows.len(),
        plan.unscheduled.len()
    );
    println!("📁 Output saved to: {}", report.location);
    Ok(())
}
