mod common;

use common::eval_in;
use sandbox_js::Budget;
use sandbox_js::Realm;
use sandbox_js::SandboxError;
use sandbox_js::TerminationReason;

#[test]
fn infinite_loop_runs_out_of_fuel() {
  let mut realm = Realm::new(Budget {
    fuel: 10_000,
    max_stack_depth: 32,
  });
  let err = eval_in(&mut realm, "while (true) {}").unwrap_err();
  assert!(matches!(
    err,
    SandboxError::Termination(TerminationReason::OutOfFuel)
  ));
}

#[test]
fn termination_is_not_catchable() {
  let mut realm = Realm::new(Budget {
    fuel: 10_000,
    max_stack_depth: 32,
  });
  let err = eval_in(&mut realm, "try { for (;;) {} } catch (e) { 'caught' }").unwrap_err();
  assert!(!err.is_catchable());
}

#[test]
fn runaway_recursion_overflows_the_stack() {
  let mut realm = Realm::new(Budget {
    fuel: 1_000_000,
    max_stack_depth: 32,
  });
  let err = eval_in(&mut realm, "function f() { return f(); } f()").unwrap_err();
  assert!(matches!(
    err,
    SandboxError::Termination(TerminationReason::StackOverflow)
  ));
}

#[test]
fn fuel_is_refilled_for_each_evaluation() -> Result<(), SandboxError> {
  let mut realm = Realm::new(Budget {
    fuel: 2_000,
    max_stack_depth: 32,
  });
  eval_in(&mut realm, "function spin(n) { var i = 0; while (i < n) i++; return i; }")?;
  for _ in 0..5 {
    assert_eq!(eval_in(&mut realm, "spin(300)")?, "300");
  }
  Ok(())
}
