//! End-to-end interactive flows over scripted keys and captured frames.
//!
//! These tests exercise the same state machines and run loops the real
//! terminal drives, with `ScriptedKeys` as the input seam and
//! `CaptureSurface` as the output seam. Determinism of (state, event)
//! transitions makes the replays exact.

use std::time::{Duration, Instant};

use crank::cancel::{CancellationContext, CtrlC, Flow, InterruptState};
use crank::interrupt::{self, Checkpoint, InterruptChoice};
use crank::menu::multi::{MultiOutcome, MultiSelectMenu};
use crank::menu::select::{SelectMenu, SelectOutcome};
use crank::menu::viewport::ViewportState;
use crank::menu::{MenuEntry, MenuError, MenuItem};
use crank::prompt::line::{text_with, TextPrompt};
use crank::prompt::PromptOutcome;
use crank::session::{session_menu_with, SessionAction, SessionInfo, SessionOutcome};
use crank::term::keys::{presses, Key, KeyEvent, ScriptedKeys};
use crank::term::surface::CaptureSurface;

fn key(k: Key) -> KeyEvent {
    KeyEvent::plain(k)
}

fn color_menu() -> SelectMenu {
    SelectMenu::new(
        "Pick a color",
        vec![
            MenuEntry::Item(MenuItem::new("Red", "Red").hotkey('R')),
            MenuEntry::Item(MenuItem::new("Green", "Green").hotkey('G')),
            MenuEntry::Item(MenuItem::new("Blue", "Blue").hotkey('B')),
        ],
    )
    .unwrap()
}

#[test]
fn scenario_hotkey_resolves_green_immediately() {
    // Single-select with R/G/B hotkeys: pressing G resolves "Green" with no
    // navigation keys consumed.
    let mut menu = color_menu();
    let mut keys = ScriptedKeys::new(vec![KeyEvent::ch('G')]);
    let mut surface = CaptureSurface::new();
    let ctx = CancellationContext::new();

    let flow = menu.run_with(&mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(
        flow.unwrap_resolved(),
        SelectOutcome::Selected("Green".to_string())
    );
    assert_eq!(keys.remaining(), 0);
}

#[test]
fn scenario_multi_select_min_one_blocks_empty_enter() {
    let entries: Vec<MenuEntry> = ["alpha", "beta", "gamma"]
        .iter()
        .map(|n| MenuEntry::item(n.to_string(), n.to_string()))
        .collect();
    let mut menu = MultiSelectMenu::new("Pick", entries).unwrap().min_select(1);

    // Empty Enter leaves the menu open; the next keys still get consumed by
    // the same run loop.
    let mut keys = ScriptedKeys::new(vec![
        key(Key::Enter),
        KeyEvent::ch(' '),
        key(Key::Enter),
    ]);
    let mut surface = CaptureSurface::new();
    let ctx = CancellationContext::new();

    let flow = menu.run_with(&mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(
        flow.unwrap_resolved(),
        MultiOutcome::Submitted(vec!["alpha".to_string()])
    );
}

#[test]
fn scenario_interrupt_digit_two_then_driver_checkpoint() {
    // Interrupt menu opened mid-operation; `2` resolves stop-after and the
    // next checkpoint finishes the step, stops the loop, and resets state.
    let ctx = CancellationContext::new();
    let mut keys = ScriptedKeys::new(vec![KeyEvent::ch('2')]);
    let mut surface = CaptureSurface::new();

    let flow = interrupt::interrupt_menu_with("iteration 2", &mut keys, &mut surface, &ctx)
        .unwrap();
    assert_eq!(flow.unwrap_resolved(), InterruptChoice::StopAfter);
    assert_eq!(ctx.interrupt_state(), InterruptState::StopAfterIteration);

    // Driver checkpoint: stop the loop, then reset for the next run.
    assert_eq!(interrupt::checkpoint(&ctx), Checkpoint::StopLoop);
    ctx.reset_interrupt_state();
    assert_eq!(ctx.interrupt_state(), InterruptState::None);
    assert_eq!(interrupt::checkpoint(&ctx), Checkpoint::Proceed);
}

#[test]
fn scenario_required_text_prompt_reprompts_on_empty() {
    let spec = TextPrompt::new("Session name").required();
    let mut script = vec![key(Key::Enter)]; // rejected: empty
    script.extend(presses("alpha"));
    script.push(key(Key::Enter));

    let mut keys = ScriptedKeys::new(script);
    let mut surface = CaptureSurface::new();
    let ctx = CancellationContext::new();

    let flow = text_with(&spec, &mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(
        flow.unwrap_resolved(),
        PromptOutcome::Submitted("alpha".to_string())
    );
    assert!(surface.ever_contains("required"));
}

#[test]
fn double_interrupt_timing_window() {
    let ctx = CancellationContext::new();
    let t0 = Instant::now();

    // Two presses under 2000ms apart: the second is a force exit.
    assert_eq!(ctx.press_ctrl_c_at(t0), CtrlC::Soft);
    assert_eq!(
        ctx.press_ctrl_c_at(t0 + Duration::from_millis(500)),
        CtrlC::ForceExit
    );

    // Two presses 2000ms apart or more: both independent soft cancels.
    let ctx = CancellationContext::new();
    assert_eq!(ctx.press_ctrl_c_at(t0), CtrlC::Soft);
    assert_eq!(
        ctx.press_ctrl_c_at(t0 + Duration::from_millis(2000)),
        CtrlC::Soft
    );
}

#[test]
fn hotkey_and_navigation_resolve_the_same_value() {
    let ctx = CancellationContext::new();

    let mut by_hotkey = color_menu();
    let mut keys = ScriptedKeys::new(vec![KeyEvent::ch('b')]);
    let mut surface = CaptureSurface::new();
    let hotkey = by_hotkey
        .run_with(&mut keys, &mut surface, &ctx)
        .unwrap()
        .unwrap_resolved();

    let mut by_nav = color_menu();
    let mut keys = ScriptedKeys::new(vec![key(Key::Down), key(Key::Down), key(Key::Enter)]);
    let mut surface = CaptureSurface::new();
    let nav = by_nav
        .run_with(&mut keys, &mut surface, &ctx)
        .unwrap()
        .unwrap_resolved();

    assert_eq!(hotkey, nav);
}

#[test]
fn long_menu_scrolls_viewport_not_everything() {
    let entries: Vec<MenuEntry> = (0..100)
        .map(|i| MenuEntry::item(format!("Task {i:03}"), format!("{i}")))
        .collect();
    let mut menu = SelectMenu::new("Backlog", entries).unwrap().height(10);

    // Walk to the end and resolve.
    let mut keys = ScriptedKeys::new(vec![key(Key::End), key(Key::Enter)]);
    let mut surface = CaptureSurface::new();
    let ctx = CancellationContext::new();

    let flow = menu.run_with(&mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(
        flow.unwrap_resolved(),
        SelectOutcome::Selected("99".to_string())
    );

    // Every painted frame stays proportional to the window, and the frame
    // after End shows the scroll-up indicator.
    for frame in &surface.frames {
        assert!(frame.len() <= 14, "frame has {} lines", frame.len());
    }
    assert!(surface.ever_contains("↑ more"));
}

#[test]
fn viewport_replay_is_deterministic() {
    // The same event sequence from the same initial state must land on the
    // same final state — the degraded-path testability guarantee.
    let run = || {
        let mut state = ViewportState::new(40, 8);
        for focus in [5usize, 12, 30, 8, 39, 0, 21] {
            state = state.update(focus, 2);
        }
        state
    };
    assert_eq!(run(), run());
}

#[test]
fn session_flow_select_new_delete() {
    let sessions = vec![
        SessionInfo::new("alpha").description("14 iterations"),
        SessionInfo::new("beta"),
    ];
    let ctx = CancellationContext::new();

    // Arrow down past the header onto "beta", Enter selects it.
    let mut keys = ScriptedKeys::new(vec![key(Key::Down), key(Key::Enter)]);
    let mut surface = CaptureSurface::new();
    let flow = session_menu_with(&sessions, &mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(
        flow.unwrap_resolved(),
        SessionOutcome::Action(SessionAction::Select("beta".to_string()))
    );

    // Delete via hotkey, then pick the first session in the sub-picker.
    let mut keys = ScriptedKeys::new(vec![KeyEvent::ch('d'), key(Key::Enter)]);
    let mut surface = CaptureSurface::new();
    let flow = session_menu_with(&sessions, &mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(
        flow.unwrap_resolved(),
        SessionOutcome::Action(SessionAction::Delete("alpha".to_string()))
    );
}

#[test]
fn menu_with_no_selectable_items_reports_error() {
    let entries = vec![
        MenuEntry::Header("Nothing here".to_string()),
        MenuEntry::Item(MenuItem::new("Gone", "gone").disabled("removed")),
        MenuEntry::Separator,
    ];
    assert_eq!(
        SelectMenu::new("Empty", entries).err(),
        Some(MenuError::NoSelectableItems)
    );
}

#[test]
fn force_exit_does_not_leak_into_new_contexts() {
    // A force-exit classification in one context leaves an independent
    // context's timer untouched.
    let a = CancellationContext::new();
    let b = CancellationContext::new();
    let t0 = Instant::now();
    a.press_ctrl_c_at(t0);
    assert_eq!(a.press_ctrl_c_at(t0 + Duration::from_millis(100)), CtrlC::ForceExit);
    assert_eq!(b.press_ctrl_c_at(t0 + Duration::from_millis(100)), CtrlC::Soft);
}

#[test]
fn interrupt_menu_reentry_is_a_silent_continue() {
    let ctx = CancellationContext::new();
    assert!(ctx.try_enter_menu());

    let mut keys = ScriptedKeys::new(vec![]);
    let mut surface = CaptureSurface::new();
    let flow = interrupt::interrupt_menu_with("step", &mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(flow.unwrap_resolved(), InterruptChoice::Continue);
    assert!(surface.frames.is_empty());
    assert_eq!(ctx.interrupt_state(), InterruptState::None);
    ctx.leave_menu();
}

#[test]
fn soft_cancel_inside_menu_does_not_force_exit_later_runs() {
    // One soft Ctrl+C cancels a menu; a fresh menu run after the window has
    // passed cancels softly again instead of force-exiting.
    let ctx = CancellationContext::with_window(Duration::from_millis(0));

    let mut menu = color_menu();
    let mut keys = ScriptedKeys::new(vec![KeyEvent::ctrl('c')]);
    let mut surface = CaptureSurface::new();
    let flow = menu.run_with(&mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(flow.unwrap_resolved(), SelectOutcome::Cancelled);

    let mut menu = color_menu();
    let mut keys = ScriptedKeys::new(vec![KeyEvent::ctrl('c')]);
    let mut surface = CaptureSurface::new();
    let flow = menu.run_with(&mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(flow.unwrap_resolved(), SelectOutcome::Cancelled);
}

#[test]
fn ctrl_c_force_exit_propagates_out_of_nested_components() {
    // Second Ctrl+C inside the session dialog's sub-picker surfaces as
    // Flow::ForceExit from the outer call; the process exit is the caller's.
    let sessions = vec![SessionInfo::new("only")];
    let ctx = CancellationContext::new();

    let mut keys = ScriptedKeys::new(vec![
        KeyEvent::ch('d'),
        KeyEvent::ctrl('c'),
        KeyEvent::ctrl('c'),
    ]);
    let mut surface = CaptureSurface::new();

    // First Ctrl+C cancels the sub-picker back to the main menu; the second,
    // inside the window, forces exit.
    let flow = session_menu_with(&sessions, &mut keys, &mut surface, &ctx).unwrap();
    assert_eq!(flow, Flow::ForceExit);
}
