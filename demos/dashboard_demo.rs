//! 看板引擎演示程序
//!
//! 展示库存分级、聚合统计、医院与献血者过滤以及统计回退

use bloodbank_admin::{init_logging, LoggingConfig};
use bloodbank_core::{BloodGroup, Role, SessionContext};
use bloodbank_integration::{InMemoryStore, StoreOperation};
use bloodbank_workflow::{
    BadgeKind, DashboardEngine, DonorDraft, DonorFilter, HospitalDraft, HospitalFilter,
    InventoryDraft,
};
use chrono::NaiveDate;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::default())?;

    println!("🚀 血库看板演示\n");

    let store = Arc::new(InMemoryStore::with_sample_data());
    let session = SessionContext {
        role: Role::Donor,
        email: Some("priya@example.org".to_string()),
        donor_registered: false,
    };
    let mut engine = DashboardEngine::new(store.clone(), session);
    engine.refresh_all().await?;

    // 1. 新医院与库存
    let metro = engine
        .create_hospital(&HospitalDraft {
            name: "Metro Blood Bank".to_string(),
            email: "metro@example.org".to_string(),
            phone: "555-0100".to_string(),
            city: "Lansing".to_string(),
            license: "LIC-MT-003".to_string(),
        })
        .await?;
    println!("✅ 新增医院 #{} {}", metro.id, metro.name);

    for (group, units) in [(BloodGroup::AbNegative, 3), (BloodGroup::APositive, 6)] {
        engine
            .upsert_inventory(&InventoryDraft {
                id: None,
                hospital_id: Some(metro.id),
                hospital_name: None,
                blood_group: Some(group),
                units,
                expiry: NaiveDate::from_ymd_opt(2025, 6, 30),
            })
            .await?;
    }

    println!("\n🧪 库存分级:");
    for row in engine.inventory().rows() {
        println!(
            "   #{:<3} {:<18} {:<4} {:>3}  {}",
            row.record.id,
            row.record.hospital_name.as_deref().unwrap_or("-"),
            row.record.blood_group.label(),
            row.record.units,
            BadgeKind::from(row.severity).badge().label
        );
    }

    // 2. 献血者注册与可用状态
    let donor = engine
        .register_donor(&DonorDraft {
            name: "Priya".to_string(),
            gender: "female".to_string(),
            blood_group: Some(BloodGroup::ONegative),
            phone: "555-0142".to_string(),
            city: "Lansing".to_string(),
            email: None,
        })
        .await?;
    engine.toggle_donor(donor.id).await?;
    println!("\n✅ 献血者 #{} 已注册并设为可献血", donor.id);

    let profile = engine.donor_profile(None).await?;
    println!("   档案 {}: 献血历史 {} 条", profile.donor.email, profile.donation_history.len());

    let nearby = engine.donors().search(&DonorFilter {
        city: Some("Lansing".to_string()),
        available: Some(true),
        ..Default::default()
    });
    println!("   Lansing 可献血者: {}", nearby.len());

    let found = engine.hospitals().search(&HospitalFilter {
        query: "la".to_string(),
        verified: None,
    });
    println!("   搜索 \"la\" 命中医院: {}", found.len());

    // 3. 概览，先取远程快照，再演示回退
    let overview = engine.overview().await;
    println!("\n📊 系统概览 ({:?}):", overview.source);
    println!("   献血者: {} (可献血 {})", overview.stats.total_donors, overview.stats.available_donors);
    println!("   进行中申请: {}", overview.stats.active_requests);
    println!("   库存总单位: {}，覆盖医院 {}", overview.inventory.total_units, overview.inventory.hospital_count);
    println!("   危急血型: {:?}", overview.inventory.critical_groups());

    store.fail_on(StoreOperation::Stats).await;
    let fallback = engine.overview().await;
    println!("\n⚠️ 统计接口失败，改用本地推导 ({:?}): 可献血 {}", fallback.source, fallback.stats.available_donors);

    println!("\n🎉 演示完成");
    Ok(())
}
