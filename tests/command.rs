use std::{cell::RefCell, convert::Infallible, rc::Rc};

use futures::executor::block_on;
use rxlite::prelude::*;

fn echo_command(
  source: Option<Subject<bool, Exception>>, scheduler: Option<TestScheduler>,
) -> Command<&'static str, &'static str, TestScheduler> {
  let mut builder = CommandBuilder::new(|p: &'static str| Ok(p));
  if let Some(source) = source {
    builder = builder.can_execute(source);
  }
  builder.scheduler(scheduler.unwrap_or_default()).build()
}

fn collect<T: 'static>(stream: impl Observable<Item = T>) -> Rc<RefCell<Vec<T>>> {
  let seen = Rc::new(RefCell::new(vec![]));
  let c_seen = seen.clone();
  stream.subscribe(move |v| c_seen.borrow_mut().push(v));
  seen
}

#[rxlite_macro::test]
fn can_execute_source_error_latches_the_command_off() {
  let source = Subject::<bool, Exception>::new();
  let command = CommandBuilder::new(|p: i32| Ok(p))
    .can_execute(source.clone())
    .build();

  let states = collect(command.can_execute());
  let exceptions = collect(command.thrown_exceptions());

  source.clone().next(false);
  assert_eq!(command.can_execute().first_now(), Ok(Ok(false)));

  source.clone().next(true);
  assert_eq!(command.can_execute().first_now(), Ok(Ok(true)));

  command.execute(1).subscribe(|_| {});

  source.clone().error(Exception::msg("Aieeeee!"));

  assert_eq!(command.can_execute().first_now(), Ok(Ok(false)));
  assert!(command.is_latched_off());

  let exceptions = exceptions.borrow();
  assert_eq!(exceptions.len(), 1);
  assert_eq!(exceptions[0].message(), "Aieeeee!");

  let states = states.borrow();
  assert!(!states[states.len() - 1]);
  assert!(states[states.len() - 2]);
}

#[rxlite_macro::test]
fn latch_survives_later_source_values() {
  let source = Subject::<bool, Exception>::new();
  let command = CommandBuilder::new(|p: i32| Ok(p))
    .can_execute(source.clone())
    .build();
  source.clone().next(true);
  source.clone().error(Exception::msg("gone"));
  source.clone().next(true);
  assert_eq!(command.can_execute().first_now(), Ok(Ok(false)));
  assert_eq!(command.execute(1).first_now(), Err(FirstValueError::Empty));
}

#[rxlite_macro::test]
fn latched_state_is_delivered_on_the_scheduler() {
  let scheduler = TestScheduler::new();
  let source = Subject::<bool, Exception>::new();
  let command = echo_command(Some(source.clone()), Some(scheduler.clone()));
  source.clone().next(true);
  source.clone().error(Exception::msg("gone"));

  let states = collect(command.can_execute());
  assert!(states.borrow().is_empty());
  scheduler.flush();
  assert_eq!(*states.borrow(), vec![false]);
}

#[rxlite_macro::test]
fn default_can_execute_is_true() {
  let command = Command::create(|p: i32| Ok(p));
  assert_eq!(command.can_execute().first_now(), Ok(Ok(true)));
}

#[rxlite_macro::test]
fn infallible_sources_are_accepted() {
  let source = BehaviorSubject::<bool, Infallible>::new(true);
  let command = CommandBuilder::new(|p: i32| Ok(p))
    .can_execute(source.clone())
    .build();
  assert_eq!(command.can_execute().first_now(), Ok(Ok(true)));
  source.clone().next(false);
  assert_eq!(command.can_execute().first_now(), Ok(Ok(false)));
}

#[rxlite_macro::test]
fn multiple_subscribers_see_each_result_once() {
  let command = Command::create(|p: i32| Ok(p));
  let odd = collect(command.results().filter(|v| v % 2 != 0));
  let even = collect(command.results().filter(|v| v % 2 == 0));

  for i in [1, 2, 1, 2] {
    assert_eq!(block_on(command.execute(i).into_future()), Ok(Ok(i)));
  }

  assert_eq!(*odd.borrow(), vec![1, 1]);
  assert_eq!(*even.borrow(), vec![2, 2]);
}

// ==================== Action errors ====================

fn throw_async(err: Exception) -> Command<(), ()> {
  Command::create_from_observable(move |_: ()| Ok(observable::throw_err::<(), _>(err.clone())))
}

fn throw_sync(err: Exception) -> Command<(), ()> {
  Command::create_from_observable(move |_: ()| {
    Err::<observable::Empty<(), Exception>, _>(err.clone())
  })
}

fn assert_error_reaches_everyone(command: Command<(), ()>, err: Exception) {
  let thrown = collect(command.thrown_exceptions());

  // No error handler at all: must not panic.
  command.execute(()).subscribe(|_| {});

  let handled = Rc::new(RefCell::new(None));
  let c_handled = handled.clone();
  command
    .execute(())
    .subscribe_err(|_| {}, move |e| *c_handled.borrow_mut() = Some(e));
  assert!(handled.borrow().as_ref().is_some_and(|e| e.ptr_eq(&err)));

  match block_on(command.execute(()).into_future()) {
    Ok(Err(e)) => assert!(e.ptr_eq(&err)),
    other => panic!("expected the action error, got {other:?}"),
  }

  assert_eq!(thrown.borrow().len(), 3);
  assert!(thrown.borrow().iter().all(|e| e.ptr_eq(&err)));
  assert_eq!(command.can_execute().first_now(), Ok(Ok(true)));
}

#[rxlite_macro::test]
fn asynchronous_action_error() {
  let err = Exception::msg("Aieeeee!");
  assert_error_reaches_everyone(throw_async(err.clone()), err);
}

#[rxlite_macro::test]
fn synchronous_action_error() {
  let err = Exception::msg("Aieeeee!");
  assert_error_reaches_everyone(throw_sync(err.clone()), err);
}

#[rxlite_macro::test]
fn action_error_without_any_listener_is_harmless() {
  let command = throw_async(Exception::msg("nobody listens"));
  command.execute(());
  assert_eq!(command.execute(()).first_now().map(|r| r.is_err()), Ok(true));
}

#[rxlite_macro::test]
async fn awaiting_an_execution() {
  let command = Command::create(|name: &'static str| Ok(name.len()));
  assert_eq!(command.execute("four").into_future().await, Ok(Ok(4)));
}

// ==================== Virtual time ====================

#[rxlite_macro::test]
fn execute_on_virtual_time() {
  let scheduler = TestScheduler::new();
  let command = echo_command(None, Some(scheduler.clone()));
  let c_command = command.clone();

  let observer = scheduler.start(move || c_command.execute("test"));

  let messages = observer.messages();
  assert_eq!(messages.first().map(|m| m.value.clone()), Some(Notification::Next("test")));
  assert_eq!(messages[0].time, TestScheduler::SUBSCRIBED);
  assert_eq!(observer.values(), vec!["test"]);
}

#[rxlite_macro::test]
fn in_flight_execution_rejects_another_one() {
  let reply = Subject::<i32, Exception>::new();
  let c_reply = reply.clone();
  let command = Command::create_from_observable(move |_: ()| Ok(c_reply.clone()));
  let executing = collect(command.is_executing());

  let first = collect(command.execute(()));
  let rejected = Rc::new(RefCell::new(vec![]));
  let (c_values, c_done) = (rejected.clone(), rejected.clone());
  command.execute(()).subscribe_all(
    move |v| c_values.borrow_mut().push(format!("next {v}")),
    |_| {},
    move || c_done.borrow_mut().push("complete".to_owned()),
  );
  assert_eq!(*rejected.borrow(), vec!["complete"]);
  assert_eq!(command.can_execute().first_now(), Ok(Ok(false)));

  reply.clone().next(9);
  reply.clone().complete();
  assert_eq!(*first.borrow(), vec![9]);
  assert_eq!(*executing.borrow(), vec![false, true, false]);
  assert_eq!(command.can_execute().first_now(), Ok(Ok(true)));
}
