//! Uplink scenarios: BSR, SR and grants against pooled configurations

use integration_tests::{
    drb_lcg, gbr_lcg, init_test_logging, TestCellConfig, TestResult, TestUeConfig, DRB1, GBR_DRB,
};
use macsched_common::{cell_span, LcgId};
use macsched_config::{
    DuCellGroupConfigPool, LogicalChannelConfig, UeConfigPtrs, UeReconfigurationRequest,
};
use macsched_lc::{BsrFormat, BsrReport, UlBsrIndication, UlLogicalChannelManager};
use tracing::info_span;

type UlSetup = (DuCellGroupConfigPool, UeConfigPtrs, UlLogicalChannelManager);

fn setup(ue: &TestUeConfig) -> TestResult<UlSetup> {
    let cell = TestCellConfig::default();
    let mut pool = DuCellGroupConfigPool::new();
    pool.add_cell(&cell.request())?;
    let cfg = pool.add_ue(&ue.request())?;
    let span = info_span!(parent: &cell_span(cell.cell_index), "ue", ue = cfg.ue_index.0);
    let ul = UlLogicalChannelManager::new(cfg.logical_channels.clone(), span);
    Ok((pool, cfg, ul))
}

#[test]
fn test_saturated_short_bsr_keeps_long_estimate() -> TestResult {
    init_test_logging();
    let (_pool, _cfg, mut ul) = setup(&TestUeConfig::default())?;
    let lcg = drb_lcg();

    ul.handle_bsr_indication(&UlBsrIndication::short(lcg, 31));
    let saturated = ul.lcg_pending_bytes(lcg);
    assert_eq!(saturated, 150_006);

    ul.handle_bsr_indication(&UlBsrIndication::short(lcg, 31));
    assert_eq!(ul.lcg_pending_bytes(lcg), saturated);

    ul.handle_bsr_indication(&UlBsrIndication::long([(lcg, 200)]));
    assert_eq!(ul.lcg_pending_bytes(lcg), 2_901_918);
    ul.handle_bsr_indication(&UlBsrIndication::short(lcg, 31));
    assert_eq!(ul.lcg_pending_bytes(lcg), 2_901_918);

    ul.handle_bsr_indication(&UlBsrIndication::long([(lcg, 100)]));
    assert_eq!(ul.lcg_pending_bytes(lcg), 5_393);

    // A non-saturated short BSR always overrides
    ul.handle_bsr_indication(&UlBsrIndication::short(lcg, 10));
    assert_eq!(ul.lcg_pending_bytes(lcg), 203);
    Ok(())
}

#[test]
fn test_srb_group_has_no_rlc_margin() -> TestResult {
    init_test_logging();
    let (_pool, _cfg, mut ul) = setup(&TestUeConfig::default())?;

    ul.handle_bsr_indication(&UlBsrIndication::short(LcgId::default(), 4));
    assert_eq!(ul.lcg_pending_bytes(LcgId::default()), 30);

    ul.handle_bsr_indication(&UlBsrIndication::short(LcgId::default(), 0));
    assert_eq!(ul.lcg_pending_bytes(LcgId::default()), 0);
    assert!(!ul.has_lcg_pending_bytes(LcgId::default()));
    Ok(())
}

#[test]
fn test_long_bsr_formats() -> TestResult {
    init_test_logging();
    let (_pool, _cfg, mut ul) = setup(&TestUeConfig::default().with_gbr())?;

    ul.handle_bsr_indication(&UlBsrIndication::long([(drb_lcg(), 10), (gbr_lcg(), 100)]));
    assert_eq!(ul.lcg_pending_bytes(drb_lcg()), 24);
    assert_eq!(ul.lcg_pending_bytes(gbr_lcg()), 5_393);
    assert_eq!(ul.pending_bytes(), 24 + 5_393);

    let mut truncated = UlBsrIndication::long([(drb_lcg(), 100)]);
    truncated.format = BsrFormat::LongTruncatedBsr;
    ul.handle_bsr_indication(&truncated);
    assert_eq!(ul.lcg_pending_bytes(drb_lcg()), 5_393);
    assert_eq!(ul.lcg_pending_bytes(gbr_lcg()), 5_393);

    ul.handle_bsr_indication(&UlBsrIndication::long([(drb_lcg(), 10)]));
    assert_eq!(ul.lcg_pending_bytes(drb_lcg()), 24);
    assert_eq!(ul.lcg_pending_bytes(gbr_lcg()), 0);

    // Reserved index
    ul.handle_bsr_indication(&UlBsrIndication::long([(drb_lcg(), 10), (gbr_lcg(), 255)]));
    assert_eq!(ul.lcg_pending_bytes(gbr_lcg()), 0);
    Ok(())
}

#[test]
fn test_reports_for_unconfigured_group_ignored() -> TestResult {
    init_test_logging();
    let (_pool, _cfg, mut ul) = setup(&TestUeConfig::default())?;
    let unused = LcgId::new(5).ok_or("invalid LCG")?;

    assert!(!ul.is_lcg_active(unused));
    ul.handle_bsr_indication(&UlBsrIndication::short(unused, 20));
    assert_eq!(ul.lcg_pending_bytes(unused), 0);
    assert_eq!(ul.pending_bytes(), 0);
    Ok(())
}

#[test]
fn test_sr_bsr_grant_cycle() -> TestResult {
    init_test_logging();
    let (_pool, _cfg, mut ul) = setup(&TestUeConfig::default())?;
    let lcg = drb_lcg();

    ul.handle_sr_indication();
    assert!(ul.has_pending_sr());
    assert!(!ul.has_pending_bytes());

    let bsr = UlBsrIndication {
        format: BsrFormat::ShortTruncatedBsr,
        reports: [BsrReport {
            lcg_id: lcg,
            buffer_size_index: 12,
        }]
        .into_iter()
        .collect(),
    };
    ul.handle_bsr_indication(&bsr);
    assert!(!ul.has_pending_sr());
    assert_eq!(ul.lcg_pending_bytes(lcg), 390);

    ul.handle_ul_grant(lcg, 300);
    assert_eq!(ul.lcg_pending_bytes(lcg), 90);
    ul.handle_ul_grant(lcg, 300);
    assert!(!ul.has_pending_bytes());

    ul.handle_sr_indication();
    ul.reset_sr_indication();
    assert!(!ul.has_pending_sr());
    Ok(())
}

#[test]
fn test_dropped_bearer_zeroes_its_group() -> TestResult {
    init_test_logging();
    let (mut pool, cfg, mut ul) = setup(&TestUeConfig::default().with_gbr())?;

    ul.handle_bsr_indication(&UlBsrIndication::long([(drb_lcg(), 10), (gbr_lcg(), 10)]));
    assert_eq!(ul.pending_bytes(), 48);

    let channels: Vec<LogicalChannelConfig> = TestUeConfig::default()
        .with_gbr()
        .logical_channels()
        .into_iter()
        .filter(|ch| ch.lcid != GBR_DRB)
        .collect();
    let reconf = pool.reconf_ue(
        &cfg,
        &UeReconfigurationRequest {
            logical_channels: Some(channels),
            ..Default::default()
        },
    )?;
    ul.configure(reconf.logical_channels.clone());

    assert!(!ul.is_lcg_active(gbr_lcg()));
    assert_eq!(ul.lcg_pending_bytes(gbr_lcg()), 0);
    assert_eq!(ul.lcg_pending_bytes(drb_lcg()), 24);

    ul.set_status(DRB1, false);
    assert!(!ul.is_lcg_active(drb_lcg()));
    assert_eq!(ul.pending_bytes(), 0);
    ul.set_status(DRB1, true);
    assert!(ul.is_lcg_active(drb_lcg()));
    assert_eq!(ul.lcg_pending_bytes(drb_lcg()), 0);
    Ok(())
}

#[test]
fn test_deactivated_ue_ignores_sr() -> TestResult {
    init_test_logging();
    let (_pool, _cfg, mut ul) = setup(&TestUeConfig::default())?;

    ul.handle_bsr_indication(&UlBsrIndication::short(drb_lcg(), 20));
    ul.handle_sr_indication();
    ul.deactivate();

    assert!(!ul.has_pending_sr());
    assert!(!ul.has_pending_bytes());
    ul.handle_sr_indication();
    assert!(!ul.has_pending_sr());
    assert!(!ul.is_lcg_active(LcgId::default()));

    let config = ul.config().clone();
    ul.configure(config);
    assert!(ul.is_lcg_active(drb_lcg()));
    assert!(!ul.has_pending_bytes());
    Ok(())
}
