//! 用血申请生命周期演示
//!
//! 提交、满足、取消以及终态拒绝，全部对接内存存储

use bloodbank_admin::{init_logging, LoggingConfig};
use bloodbank_core::{BloodGroup, Urgency};
use bloodbank_integration::{InMemoryStore, StoreOperation};
use bloodbank_workflow::{BadgeKind, RequestBoard, RequestDraft, RequestView};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    init_logging(&LoggingConfig::default())?;

    println!("🩸 用血申请生命周期演示\n");

    let store = Arc::new(InMemoryStore::with_sample_data());
    let mut board = RequestBoard::new(store.clone());
    board.refresh().await?;
    println!("✅ 已加载 {} 条申请", board.requests().len());

    // 1. 提交
    let draft = RequestDraft {
        hospital_id: Some(1),
        blood_group: Some(BloodGroup::ONegative),
        units: 2,
        urgency: Some(Urgency::Medium),
        reason: Some("急诊手术".to_string()),
        ..Default::default()
    };
    let created = board.submit(&draft, None).await?;
    println!(
        "📋 新申请 #{}: {} x{} [{}]",
        created.id,
        created.blood_group,
        created.units,
        BadgeKind::from(created.status).badge().label
    );

    // 2. 满足
    let fulfilled = board.fulfill(created.id).await?;
    println!("✅ 申请 #{} → {}", fulfilled.id, fulfilled.status);

    // 3. 终态后取消被本地拒绝
    match board.cancel(created.id).await {
        Ok(_) => println!("❌ 不应允许取消已满足的申请"),
        Err(e) => println!("🚫 取消被拒绝: {}", e),
    }
    println!(
        "   远程状态更新调用次数: {}",
        store.calls(StoreOperation::UpdateRequestStatus).await
    );

    // 4. 远程失败时镜像不变
    store.fail_on(StoreOperation::UpdateRequestStatus).await;
    if let Err(e) = board.cancel(1).await {
        println!("⚠️ 远程拒绝: {}", e);
    }
    store.recover(StoreOperation::UpdateRequestStatus).await;
    let cancelled = board.cancel(1).await?;
    println!("✅ 重试后申请 #{} → {}", cancelled.id, cancelled.status);

    println!("\n📊 各页签:");
    let counts = board.counts();
    for view in RequestView::ALL {
        println!("   {:<10} {}", view.label(), counts.get(view));
    }

    println!("\n🎉 演示完成");
    Ok(())
}
