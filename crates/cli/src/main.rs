use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use records::{AuditStatus, BedStatus, LogType};
use serde::Serialize;
use std::path::PathBuf;
use wardboard_core::{
    audit::{self, AuditFilter, AuditTab},
    badge::badge_label,
    dashboard::{self, Trend},
    notifications::{self, relative_time_label},
    occupancy, open_store, search,
    wards::{self, BedFilter},
    CoreConfig, RecordStore,
};
use wardboard_types::SearchTerm;

#[derive(Parser)]
#[command(name = "wardboard")]
#[command(about = "Clinic dashboard figures from the command line")]
struct Cli {
    /// Read records from a JSON snapshot instead of the configured backend
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dashboard KPIs with trends
    Dashboard,
    /// Bed occupancy by department
    Occupancy,
    /// Ward summary and bed listing
    Wards {
        /// Only list beds of this department
        #[arg(long)]
        department: Option<String>,
        /// Only list beds in this state ("Disponível", "Ocupado", "Manutenção")
        #[arg(long)]
        status: Option<BedStatus>,
    },
    /// Current notification feed
    Notifications,
    /// Search patients, professionals and medical records
    Search {
        /// Text to look for
        query: String,
    },
    /// Latest audit entries
    Audit {
        /// "todos", "seguranca", "acessos" or "modificacoes"
        #[arg(long, default_value = "todos")]
        tab: AuditTab,
        /// Match user, action or resource
        #[arg(long)]
        search: Option<String>,
        /// First day (YYYY-MM-DD), inclusive
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        status: Option<AuditStatus>,
        #[arg(long)]
        log_type: Option<LogType>,
        #[arg(long)]
        resource: Option<String>,
    },
    /// Audit statistics
    AuditStats,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn trend_text(trend: &Option<Trend>) -> String {
    match trend {
        Some(t) => format!(" ({:+} {})", t.value, t.label),
        None => String::new(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cfg = match cli.snapshot {
        Some(path) => CoreConfig::for_snapshot(path),
        None => {
            dotenvy::dotenv().ok();
            CoreConfig::from_process_env()?
        }
    };
    let opened = open_store(&cfg)?;
    let store: &dyn RecordStore = opened.records.as_ref();

    match cli.command {
        Commands::Dashboard => {
            let report = dashboard::load_dashboard(store, cfg.now()).await;
            if cli.json {
                return print_json(&report);
            }
            let stats = &report.stats;
            println!(
                "Pacientes: {}{}",
                stats.total_patients,
                trend_text(&stats.patients_trend)
            );
            println!(
                "Consultas agendadas: {}{}",
                stats.scheduled_appointments,
                trend_text(&stats.appointments_trend)
            );
            println!(
                "Leitos ocupados: {}/{} ({}%)",
                stats.occupied_beds, stats.total_beds, stats.occupancy_percentage
            );
            println!(
                "Internações ativas: {}{}",
                stats.active_admissions,
                trend_text(&stats.admissions_trend)
            );
            for failure in &report.failures {
                eprintln!("{}: {}", failure.slot, failure.message);
            }
        }
        Commands::Occupancy => {
            let departments = occupancy::load_occupancy(store).await?;
            if cli.json {
                return print_json(&departments);
            }
            if departments.is_empty() {
                println!("No beds found.");
            }
            for d in departments {
                println!(
                    "{}: {}/{} ({}%, {:?})",
                    d.name, d.occupied, d.total, d.percentage, d.level
                );
            }
        }
        Commands::Wards { department, status } => {
            let filter = BedFilter { department, status };
            let board = wards::load_ward_board(store, cfg.departments(), &filter).await?;
            if cli.json {
                return print_json(&board);
            }
            let totals = &board.summary.totals;
            println!(
                "Leitos: {}, ocupados: {}, disponíveis: {}, pacientes críticos: {}",
                totals.total_beds, totals.occupied, totals.available, totals.critical_patients
            );
            for d in &board.summary.departments {
                println!(
                    "{}: {}/{} ({}%) {}, críticos: {}",
                    d.name,
                    d.occupied,
                    d.total,
                    d.percentage,
                    d.alert.label(),
                    d.critical
                );
            }
            for b in &board.beds {
                let marker = if b.is_critical() { " !" } else { "" };
                println!(
                    "  {} {} {}{}",
                    b.bed.department, b.bed.bed_number, b.bed.status, marker
                );
            }
        }
        Commands::Notifications => {
            let now = cfg.now();
            let feed = notifications::fetch_notifications(store, now).await?;
            if cli.json {
                return print_json(&feed);
            }
            match badge_label(feed.len()) {
                Some(badge) => println!("Notificações: {}", badge),
                None => println!("Nenhuma notificação"),
            }
            for n in feed {
                println!(
                    "[{}] {}: {}",
                    relative_time_label(n.time, now),
                    n.title,
                    n.message
                );
            }
        }
        Commands::Search { query } => {
            let results = search::search(store, &query).await?;
            if cli.json {
                return print_json(&results);
            }
            if results.is_empty() {
                println!("Nenhum resultado.");
            }
            for r in results {
                match r.subtitle {
                    Some(subtitle) => println!("{}: {} ({})", r.kind.label(), r.name, subtitle),
                    None => println!("{}: {}", r.kind.label(), r.name),
                }
            }
        }
        Commands::Audit {
            tab,
            search,
            from,
            to,
            status,
            log_type,
            resource,
        } => {
            let filter = AuditFilter {
                search: search.as_deref().and_then(SearchTerm::parse),
                tab,
                date_from: from,
                date_to: to,
                status,
                log_type,
                resource,
            };
            let logs = audit::fetch_audit_logs(store).await?;
            let view = audit::audit_view(&logs, &filter);
            if cli.json {
                return print_json(&view);
            }
            for alert in &view.alerts {
                println!("! {} - {}", alert.title, alert.description);
            }
            for log in &view.logs {
                println!(
                    "{} {} {} {} [{}]",
                    log.created_at.format("%d/%m/%Y %H:%M"),
                    log.user_name,
                    log.action,
                    log.resource,
                    log.status
                );
            }
        }
        Commands::AuditStats => {
            let stats = audit::load_audit_stats(store, cfg.now()).await?;
            if cli.json {
                return print_json(&stats);
            }
            println!("Eventos hoje: {}", stats.today_events);
            println!("Taxa de sucesso: {:.1}%", stats.success_rate);
            println!("Alertas ativos: {}", stats.active_alerts);
            println!("Tentativas bloqueadas: {}", stats.blocked_attempts);
        }
    }

    Ok(())
}
