use scribe_core::prelude::*;

fn record(events: &[RawEvent]) -> SessionState {
    let mut state = SessionState::armed();
    for e in events {
        state.apply(e);
    }
    state
}

/// Depth walk over rendered lines; panics on a closer without an opener
fn step_depth_after(lines: &[String]) -> i64 {
    let mut depth = 0i64;
    for line in lines {
        let line = line.trim_start();
        if line.starts_with("await test.step(") {
            depth += 1;
        } else if line == "});" {
            depth -= 1;
            assert!(depth >= 0, "closer without opener in {:?}", lines);
        }
    }
    depth
}

#[test]
fn step_blocks_balance_for_any_interleaving() {
    // Small LCG so the interleavings are reproducible
    let mut seed: u64 = 0x5eed;
    for _ in 0..200 {
        let mut events = Vec::new();
        for _ in 0..24 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            events.push(match (seed >> 33) % 3 {
                0 => RawEvent::step_start(Some("s")),
                1 => RawEvent::StepEnd,
                _ => RawEvent::comment("body"),
            });
        }
        let state = record(&events);
        let starts = state
            .log()
            .iter()
            .filter(|a| matches!(a, Action::StepBoundary { which: StepEdge::Start, .. }))
            .count();
        let ends = state
            .log()
            .iter()
            .filter(|a| matches!(a, Action::StepBoundary { which: StepEdge::End, .. }))
            .count();
        assert_eq!(starts - ends, state.open_steps().len());
        assert_eq!(step_depth_after(&state.render()), 0);
    }
}

#[test]
fn log_never_holds_adjacent_move_runs() {
    let mut events = vec![RawEvent::mouse_down(0.0, 0.0)];
    for i in 0..50 {
        events.push(RawEvent::mouse_move(i as f64, i as f64));
        if i % 7 == 0 {
            events.push(RawEvent::mouse_up(i as f64, i as f64));
            events.push(RawEvent::mouse_move(0.0, 0.0));
            events.push(RawEvent::mouse_down(i as f64, i as f64));
        }
    }
    let state = record(&events);
    for pair in state.log().windows(2) {
        let both_runs = matches!(pair[0], Action::MouseMoveRun { .. })
            && matches!(pair[1], Action::MouseMoveRun { .. });
        assert!(!both_runs, "adjacent runs: {:?}", pair);
    }
}

#[test]
fn unfinished_step_is_closed_on_render() {
    let state = record(&[RawEvent::step_start(Some("a")), RawEvent::comment("x")]);
    let script = compile(state.log(), state.open_steps(), &ScriptTemplate::bare());
    assert_eq!(
        script,
        "await test.step(\"a\", async () => {\n  // x\n});\n"
    );
}

#[test]
fn rendering_a_prefix_yields_a_prefix() {
    let events = [
        RawEvent::navigation("https://example.com"),
        RawEvent::mouse_down(1.0, 1.0),
        RawEvent::mouse_up(1.0, 1.0),
        RawEvent::key_down("a", Modifiers::none()),
        RawEvent::key_up("a", Modifiers::none()),
        RawEvent::comment("done"),
    ];
    let full = record(&events).render();
    let partial = record(&events[..3]).render();
    assert_eq!(&full[..partial.len()], &partial[..]);
}

#[test]
fn streaming_after_render_keeps_output_consistent() {
    let mut state = SessionState::armed();
    state.apply(&RawEvent::step_start(Some("outer")));
    let early = state.render();
    assert_eq!(early.last().map(String::as_str), Some("});"));

    state.apply(&RawEvent::wheel(3.0, 3.0, 0.0, 100.0));
    state.apply(&RawEvent::wheel(3.0, 3.0, 0.0, 100.0));
    state.apply(&RawEvent::StepEnd);
    state.apply(&RawEvent::StepEnd);

    assert_eq!(
        state.render(),
        vec![
            r#"await test.step("outer", async () => {"#,
            "  await page.mouse.move(3, 3);",
            "  await page.mouse.wheel(0, 200);",
            "});",
        ]
    );
}
