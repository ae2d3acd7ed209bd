//! 血库看板命令行

use anyhow::{Context, Result};
use bloodbank_admin::{init_logging, ConfigManager};
use bloodbank_core::{BloodGroup, RecordId, Urgency};
use bloodbank_integration::HttpStore;
use bloodbank_workflow::{
    BadgeKind, DashboardEngine, DonorFilter, HospitalFilter, RequestDraft, RequestView,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::{error, info};

/// 血库看板命令行参数
#[derive(Parser, Debug)]
#[command(name = "bloodbank")]
#[command(about = "血库协调看板：用血申请、库存、医院与献血者")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "bloodbank.toml")]
    config: String,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<String>,

    /// 远程存储地址，覆盖配置文件
    #[arg(short, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 写出当前生效的配置
    Init,
    /// 看板统计
    Stats,
    /// 列出用血申请
    Requests {
        #[arg(long, value_enum, default_value = "all")]
        view: ViewArg,
    },
    /// 提交用血申请
    Submit {
        #[arg(long)]
        hospital: RecordId,
        #[arg(long)]
        group: BloodGroup,
        #[arg(long, default_value_t = 1)]
        units: i64,
        #[arg(long)]
        urgency: Option<Urgency>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        patient: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// 标记申请已满足
    Fulfill { id: RecordId },
    /// 取消申请
    Cancel { id: RecordId },
    /// 库存及严重程度
    Inventory,
    /// 列出医院
    Hospitals {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// 切换医院认证状态
    VerifyHospital { id: RecordId },
    /// 列出献血者
    Donors {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        group: Option<BloodGroup>,
        #[arg(long)]
        city: Option<String>,
    },
    /// 切换献血者可用状态
    ToggleDonor { id: RecordId },
    /// 献血者档案与献血历史，默认使用会话邮箱
    Profile {
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ViewArg {
    All,
    Pending,
    Fulfilled,
    Cancelled,
}

impl From<ViewArg> for RequestView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::All => RequestView::All,
            ViewArg::Pending => RequestView::Pending,
            ViewArg::Fulfilled => RequestView::Fulfilled,
            ViewArg::Cancelled => RequestView::Cancelled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let manager = ConfigManager::load(&args.config)?;
    let mut config = manager.get_config().await;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.store.endpoint = endpoint.clone();
    }
    manager.update_config(config.clone()).await?;

    init_logging(&config.logging)?;

    if let Command::Init = args.command {
        manager.save(None).await?;
        println!("配置已写入 {}", manager.config_path());
        return Ok(());
    }

    let store = Arc::new(HttpStore::new(config.store.clone()));
    let mut engine = DashboardEngine::new(store, config.session.to_context());
    engine
        .refresh_all()
        .await
        .with_context(|| format!("Failed to load dashboard from {}", config.store.endpoint))?;

    if let Err(e) = run(&mut engine, args.command).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(engine: &mut DashboardEngine, command: Command) -> Result<()> {
    match command {
        Command::Init => {}
        Command::Stats => {
            let overview = engine.overview().await;
            println!("📊 看板统计 ({:?})", overview.source);
            println!("  献血者总数: {}", overview.stats.total_donors);
            println!("  可献血者: {}", overview.stats.available_donors);
            println!("  进行中申请: {}", overview.stats.active_requests);
            println!("  库存总单位: {}", overview.inventory.total_units);
            println!("  覆盖医院: {}", overview.inventory.hospital_count);
            for (group, units) in &overview.inventory.units_by_group {
                let badge = BadgeKind::from(overview.inventory.severity_for(*group)).badge();
                println!("    {:<4} {:>5}  {}", group.label(), units, badge.label);
            }
        }
        Command::Requests { view } => {
            let view = RequestView::from(view);
            let counts = engine.requests().counts();
            for tab in RequestView::ALL {
                print!("{}({}) ", tab.label(), counts.get(tab));
            }
            println!();
            for request in engine.requests().view(view) {
                println!(
                    "#{:<4} {:<4} x{:<3} {:<9} {:<10} {}",
                    request.id,
                    request.blood_group.label(),
                    request.units,
                    BadgeKind::from(request.urgency).badge().label,
                    BadgeKind::from(request.status).badge().label,
                    request.hospital_name.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Submit {
            hospital,
            group,
            units,
            urgency,
            phone,
            patient,
            reason,
        } => {
            let draft = RequestDraft {
                hospital_id: Some(hospital),
                blood_group: Some(group),
                units,
                urgency,
                phone,
                patient_name: patient,
                reason,
            };
            let created = engine.submit_request(&draft).await?;
            println!("✅ 已提交申请 #{} ({})", created.id, created.status);
        }
        Command::Fulfill { id } => {
            let request = engine.fulfill_request(id).await?;
            println!("✅ 申请 #{} → {}", request.id, request.status);
        }
        Command::Cancel { id } => {
            let request = engine.cancel_request(id).await?;
            println!("✅ 申请 #{} → {}", request.id, request.status);
        }
        Command::Inventory => {
            for row in engine.inventory().rows() {
                println!(
                    "#{:<4} {:<20} {:<4} {:>5}  {:<10} 有效期至 {}",
                    row.record.id,
                    row.record.hospital_name.as_deref().unwrap_or("-"),
                    row.record.blood_group.label(),
                    row.record.units,
                    BadgeKind::from(row.severity).badge().label,
                    row.record.expiry,
                );
            }
        }
        Command::Hospitals { search } => {
            let filter = HospitalFilter {
                query: search,
                verified: None,
            };
            for hospital in engine.hospitals().search(&filter) {
                let mark = if hospital.verified { "✔" } else { " " };
                println!("#{:<4} {} {:<24} {:<12} {}", hospital.id, mark, hospital.name, hospital.city, hospital.license);
            }
        }
        Command::VerifyHospital { id } => match engine.toggle_hospital(id).await? {
            Some(hospital) => println!("✅ 医院 #{} 认证状态: {}", hospital.id, hospital.verified),
            None => println!("⚠️ 未找到医院 #{}", id),
        },
        Command::Donors { search, group, city } => {
            let filter = DonorFilter {
                query: search,
                blood_group: group,
                city,
                available: None,
            };
            for donor in engine.donors().search(&filter) {
                let mark = if donor.available { "可献血" } else { "暂不可" };
                println!(
                    "#{:<4} {:<16} {:<4} {:<12} {} (献血 {} 次)",
                    donor.id,
                    donor.name,
                    donor.blood_group.label(),
                    donor.city,
                    mark,
                    donor.donation_count
                );
            }
        }
        Command::ToggleDonor { id } => match engine.toggle_donor(id).await? {
            Some(donor) => println!("✅ 献血者 #{} 可用状态: {}", donor.id, donor.available),
            None => println!("⚠️ 未找到献血者 #{}", id),
        },
        Command::Profile { email } => {
            let profile = engine.donor_profile(email.as_deref()).await?;
            let donor = &profile.donor;
            println!(
                "#{:<4} {:<16} {:<4} {:<12} {}",
                donor.id,
                donor.name,
                donor.blood_group.label(),
                donor.city,
                donor.email
            );
            println!("  献血 {} 次", donor.donation_count);
            for donation in &profile.donation_history {
                println!(
                    "    {}  {:>3} 单位  {}",
                    donation.date_time, donation.units, donation.requestor_name
                );
            }
        }
    }

    info!("Command completed");
    Ok(())
}
