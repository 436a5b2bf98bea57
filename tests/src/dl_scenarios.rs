//! Downlink scenarios: configuration pool to transport block
//!
//! Each test sets a cell up in a [`DuCellGroupConfigPool`], admits UEs into a
//! [`DlLogicalChannelSystem`] with the resulting logical-channel lists and
//! drives indications and allocations the way the cell scheduler does.

use integration_tests::{
    assert_pending_bytes_consistent, gbr_channel, gbr_channel_downgraded, init_test_logging,
    scheduler_config, TestCellConfig, TestResult, TestUeConfig, DRB1, GBR_DRB,
};
use macsched_common::{
    cell_span, load_scheduler_config_from_str, mac_sdu_required_bytes, DuUeIndex, Lcid,
    RanSliceId, SubcarrierSpacing, SRB_RAN_SLICE_ID,
};
use macsched_config::{DuCellGroupConfigPool, UeConfigPtrs, UeReconfigurationRequest};
use macsched_lc::{
    DlLogicalChannelManager, DlLogicalChannelSystem, DlMsgLcInfo, DlSchLcid, LcError,
    MacCeInfo, MacCePayload, MacCeType,
};

const AGGREGATE: [Lcid; 3] = [Lcid::SRB1, Lcid::SRB2, DRB1];

struct TestCell {
    pool: DuCellGroupConfigPool,
    dl: DlLogicalChannelSystem,
}

impl TestCell {
    fn new() -> TestResult<Self> {
        let cell = TestCellConfig::default();
        let mut pool = DuCellGroupConfigPool::new();
        pool.add_cell(&cell.request())?;
        let dl = DlLogicalChannelSystem::new(&scheduler_config(), cell_span(cell.cell_index));
        Ok(Self { pool, dl })
    }

    fn add_ue(&mut self, ue: &TestUeConfig) -> TestResult<UeConfigPtrs> {
        let cfg = self.pool.add_ue(&ue.request())?;
        self.dl.add_ue(cfg.ue_index, cfg.logical_channels.clone())?;
        Ok(cfg)
    }

    fn ue_mut(&mut self, ue_index: DuUeIndex) -> TestResult<&mut DlLogicalChannelManager> {
        self.dl.ue_mut(ue_index).ok_or_else(|| "UE not found".into())
    }
}

/// Fills one transport block the way the cell scheduler orders subPDUs:
/// Contention Resolution first, then the other CEs, then SDUs by priority.
fn build_tb(ue: &mut DlLogicalChannelManager, tb_bytes: u32) -> Vec<DlMsgLcInfo> {
    let mut remaining = tb_bytes;
    let mut subpdus = Vec::new();
    if let Some(subpdu) = ue.allocate_ue_con_res_id_mac_ce(remaining) {
        remaining -= subpdu.subpdu_bytes();
        subpdus.push(subpdu);
    }
    while let Some(subpdu) = ue.allocate_mac_ce(remaining) {
        remaining -= subpdu.subpdu_bytes();
        subpdus.push(subpdu);
    }
    while let Some(subpdu) = ue.allocate_mac_sdu(remaining, None) {
        remaining -= subpdu.subpdu_bytes();
        subpdus.push(subpdu);
    }
    subpdus
}

fn consumed(subpdus: &[DlMsgLcInfo]) -> u32 {
    subpdus.iter().map(DlMsgLcInfo::subpdu_bytes).sum()
}

#[test]
fn test_new_ue_has_nothing_pending() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;

    assert!(cfg.logical_channels.contains(Lcid::SRB0));
    let ue = cell.ue_mut(cfg.ue_index)?;
    assert_eq!(ue.pending_bytes(), 0);
    assert_eq!(ue.total_pending_bytes(), 0);
    assert!(!ue.has_lcid_pending_bytes(Lcid::SRB0));
    assert_pending_bytes_consistent(ue, &AGGREGATE);
    Ok(())
}

#[test]
fn test_srb0_only_buffer_outside_aggregate() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;
    let ue = cell.ue_mut(cfg.ue_index)?;

    ue.handle_dl_buffer_status_indication(Lcid::SRB0, 5);
    assert!(!ue.has_pending_bytes());
    assert!(ue.has_lcid_pending_bytes(Lcid::SRB0));
    assert_eq!(ue.lcid_pending_bytes(Lcid::SRB0), mac_sdu_required_bytes(5));
    assert_pending_bytes_consistent(ue, &AGGREGATE);

    ue.set_fallback_state(true);
    assert_eq!(ue.pending_bytes(), mac_sdu_required_bytes(5));
    assert_pending_bytes_consistent(ue, &[Lcid::SRB0, Lcid::SRB1]);
    Ok(())
}

#[test]
fn test_latest_ta_command_wins() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;
    let ue = cell.ue_mut(cfg.ue_index)?;

    assert!(ue.handle_mac_ce_indication(MacCeInfo::ta_cmd(0, 29)));
    assert!(ue.handle_mac_ce_indication(MacCeInfo::ta_cmd(0, 33)));
    assert_eq!(ue.pending_mac_ce_bytes(), MacCeType::TaCmd.required_bytes());

    let subpdu = ue.allocate_mac_ce(100).ok_or("TA command not scheduled")?;
    assert_eq!(subpdu.lcid, DlSchLcid::Ce(MacCeType::TaCmd));
    assert_eq!(
        subpdu.ce_payload,
        Some(MacCePayload::TaCmd { tag_id: 0, ta_cmd: 33 })
    );
    assert!(ue.allocate_mac_ce(100).is_none());
    assert!(!ue.has_pending_ces());
    Ok(())
}

#[test]
fn test_msg4_fills_transport_block_exactly() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;
    let ue = cell.ue_mut(cfg.ue_index)?;

    ue.set_fallback_state(true);
    ue.handle_mac_ce_indication(MacCeInfo::con_res_id([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]));
    ue.handle_dl_buffer_status_indication(Lcid::SRB0, 295);
    assert_eq!(ue.lcid_pending_bytes(Lcid::SRB0), 298);

    let tb_bytes = 309;
    let con_res = ue
        .allocate_ue_con_res_id_mac_ce(tb_bytes)
        .ok_or("Contention Resolution not scheduled")?;
    assert_eq!(con_res.subpdu_bytes(), 7);
    let remaining = tb_bytes - con_res.subpdu_bytes();
    assert_eq!(remaining, 302);

    let sdu = ue
        .allocate_mac_sdu(remaining, Some(Lcid::SRB0))
        .ok_or("SRB0 SDU not scheduled")?;
    assert_eq!(sdu.lcid, DlSchLcid::Sdu(Lcid::SRB0));
    assert_eq!(con_res.subpdu_bytes() + sdu.subpdu_bytes(), tb_bytes);
    assert!(!ue.has_lcid_pending_bytes(Lcid::SRB0));
    assert!(!ue.is_con_res_id_pending());
    Ok(())
}

#[test]
fn test_transport_block_order_and_fill() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;
    let ue = cell.ue_mut(cfg.ue_index)?;

    ue.handle_dl_buffer_status_indication(DRB1, 100);
    ue.handle_dl_buffer_status_indication(Lcid::SRB1, 10);
    ue.handle_mac_ce_indication(MacCeInfo::ta_cmd(0, 31));
    assert_pending_bytes_consistent(ue, &AGGREGATE);

    let subpdus = build_tb(ue, 500);
    let lcids: Vec<DlSchLcid> = subpdus.iter().map(|s| s.lcid).collect();
    assert_eq!(
        lcids,
        vec![
            DlSchLcid::Ce(MacCeType::TaCmd),
            DlSchLcid::Sdu(Lcid::SRB1),
            DlSchLcid::Sdu(DRB1)
        ]
    );
    assert_eq!(subpdus[1].sched_bytes, 10);
    assert_eq!(consumed(&subpdus), 500);
    assert_eq!(ue.total_pending_bytes(), 0);
    Ok(())
}

#[test]
fn test_segmented_drain_over_several_slots() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;
    let ue = cell.ue_mut(cfg.ue_index)?;

    ue.handle_dl_buffer_status_indication(DRB1, 1000);
    let mut slots = 0;
    while ue.has_pending_bytes() {
        let subpdus = build_tb(ue, 300);
        assert!(!subpdus.is_empty());
        assert!(consumed(&subpdus) <= 300);
        assert_pending_bytes_consistent(ue, &AGGREGATE);
        slots += 1;
        assert!(slots < 10, "buffer never drained");
    }
    assert_eq!(slots, 4);
    Ok(())
}

#[test]
fn test_ce_billed_to_data_slice() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;
    let ue = cell.ue_mut(cfg.ue_index)?;
    let embb = RanSliceId(2);

    ue.set_lcid_ran_slice(Lcid::SRB1, SRB_RAN_SLICE_ID);
    ue.set_lcid_ran_slice(Lcid::SRB2, SRB_RAN_SLICE_ID);
    ue.set_lcid_ran_slice(DRB1, embb);
    ue.handle_mac_ce_indication(MacCeInfo::ta_cmd(0, 31));
    assert_eq!(ue.pending_ce_slice(), Some(SRB_RAN_SLICE_ID));

    ue.handle_dl_buffer_status_indication(DRB1, 200);
    assert_eq!(ue.pending_ce_slice(), Some(embb));
    assert_eq!(
        ue.slice_pending_bytes(embb),
        mac_sdu_required_bytes(200) + MacCeType::TaCmd.required_bytes()
    );
    assert_eq!(
        ue.slice_pending_bytes(SRB_RAN_SLICE_ID),
        0,
        "CE bytes must be billed to exactly one slice"
    );

    let total_by_slice = ue.slice_pending_bytes(embb) + ue.slice_pending_bytes(SRB_RAN_SLICE_ID);
    assert!(total_by_slice <= ue.total_pending_bytes());

    ue.set_lcid_ran_slice(DRB1, embb);
    assert_eq!(ue.lcid_pending_bytes(DRB1), mac_sdu_required_bytes(200));
    Ok(())
}

#[test]
fn test_gbr_downgrade_resets_bit_rate() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default().with_gbr())?;

    {
        let ue = cell.ue_mut(cfg.ue_index)?;
        ue.handle_dl_buffer_status_indication(GBR_DRB, 500);
        let sdu = ue
            .allocate_mac_sdu(1000, None)
            .ok_or("GBR SDU not scheduled")?;
        assert_eq!(sdu.lcid, DlSchLcid::Sdu(GBR_DRB));
        assert_eq!(sdu.sched_bytes, 997);
    }
    cell.dl.slot_indication();
    // 997 bytes in the default 100 ms window
    assert_eq!(cell.ue_mut(cfg.ue_index)?.average_bit_rate(GBR_DRB), 79_760);

    let mut channels = TestUeConfig::default().logical_channels();
    channels.push(gbr_channel_downgraded());
    let downgraded = cell.pool.reconf_ue(
        &cfg,
        &UeReconfigurationRequest {
            logical_channels: Some(channels),
            ..Default::default()
        },
    )?;
    assert_eq!(downgraded.cells, cfg.cells);
    cell.ue_mut(cfg.ue_index)?
        .configure(downgraded.logical_channels.clone());

    cell.dl.slot_indication();
    let ue = cell.ue_mut(cfg.ue_index)?;
    assert_eq!(ue.average_bit_rate(GBR_DRB), 0);

    // Back to GBR: the window starts over
    let mut channels = TestUeConfig::default().logical_channels();
    channels.push(gbr_channel());
    let upgraded = cell.pool.reconf_ue(
        &downgraded,
        &UeReconfigurationRequest {
            logical_channels: Some(channels),
            ..Default::default()
        },
    )?;
    assert_eq!(upgraded.logical_channels, cfg.logical_channels);
    let ue = cell.ue_mut(cfg.ue_index)?;
    ue.configure(upgraded.logical_channels.clone());
    assert_eq!(ue.average_bit_rate(GBR_DRB), 0);
    Ok(())
}

#[test]
fn test_same_bearer_layout_shares_config() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let first = cell.add_ue(&TestUeConfig::default())?;
    let second = cell.add_ue(&TestUeConfig::default().with_ue_index(1))?;

    assert_eq!(first.logical_channels, second.logical_channels);
    assert_eq!(first.pcell().dl_bwp_dedicated, second.pcell().dl_bwp_dedicated);
    assert_eq!(cell.pool.nof_dl_bwp_dedicated(), 1);
    assert_eq!(cell.dl.nof_ues(), 2);

    let ue = cell.ue_mut(first.ue_index)?;
    ue.handle_dl_buffer_status_indication(DRB1, 50);
    assert!(!cell
        .dl
        .ue(second.ue_index)
        .ok_or("UE not found")?
        .has_pending_bytes());
    Ok(())
}

#[test]
fn test_duplicate_and_released_ue() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;

    let err = cell
        .dl
        .add_ue(cfg.ue_index, cfg.logical_channels.clone())
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, LcError::UeAlreadyExists { .. }));

    let released = cell.dl.remove_ue(cfg.ue_index).ok_or("UE not found")?;
    assert_eq!(released.config(), &cfg.logical_channels);
    assert!(!cell.dl.contains(cfg.ue_index));
    cell.dl.add_ue(cfg.ue_index, cfg.logical_channels.clone())?;
    Ok(())
}

#[test]
fn test_deactivated_ue_reports_nothing() -> TestResult {
    init_test_logging();
    let mut cell = TestCell::new()?;
    let cfg = cell.add_ue(&TestUeConfig::default())?;
    let ue = cell.ue_mut(cfg.ue_index)?;

    ue.handle_dl_buffer_status_indication(DRB1, 400);
    ue.handle_mac_ce_indication(MacCeInfo::drx_cmd());
    ue.deactivate();

    assert_eq!(ue.total_pending_bytes(), 0);
    assert!(!ue.handle_mac_ce_indication(MacCeInfo::ta_cmd(0, 10)));
    ue.handle_dl_buffer_status_indication(DRB1, 800);
    assert!(build_tb(ue, 1000).is_empty());
    assert_pending_bytes_consistent(ue, &AGGREGATE);
    Ok(())
}

#[test]
fn test_yaml_config_drives_bit_rate_window() -> TestResult {
    init_test_logging();
    let config = load_scheduler_config_from_str(
        "scs: 15khz\nmax_nof_ues: 4\ndefault_gbr_averaging_window_ms: 10\n",
    )?;
    config.validate()?;
    assert_eq!(config.scs, SubcarrierSpacing::Khz15);

    let mut pool = DuCellGroupConfigPool::new();
    pool.add_cell(&TestCellConfig::default().request())?;
    let ue_cfg = pool.add_ue(&TestUeConfig::default().with_ue_index(3).with_gbr().request())?;
    let mut dl = DlLogicalChannelSystem::new(&config, tracing::Span::none());

    let ue = dl.add_ue(ue_cfg.ue_index, ue_cfg.logical_channels.clone())?;
    ue.handle_dl_buffer_status_indication(GBR_DRB, 100);
    let sdu = ue
        .allocate_mac_sdu(102, Some(GBR_DRB))
        .ok_or("GBR SDU not scheduled")?;
    assert_eq!(sdu.sched_bytes, 100);
    dl.slot_indication();
    // 100 bytes in a 10 ms window
    let ue = dl.ue(ue_cfg.ue_index).ok_or("UE not found")?;
    assert_eq!(ue.average_bit_rate(GBR_DRB), 80_000);

    // Ten 1 ms slots later the sample has left the window
    for _ in 0..10 {
        dl.slot_indication();
    }
    let ue = dl.ue(ue_cfg.ue_index).ok_or("UE not found")?;
    assert_eq!(ue.average_bit_rate(GBR_DRB), 0);

    let err = dl
        .add_ue(DuUeIndex(4), ue_cfg.logical_channels.clone())
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, LcError::UeIndexOutOfRange { capacity: 4, .. }));
    Ok(())
}
