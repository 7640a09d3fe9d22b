use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  scheduler::Scheduler,
  subscriber::{Subscriber, SubscriberHandle},
};

/// Re-emits every notification of the source as a task on `scheduler`.
///
/// Unsubscribing closes the downstream immediately, so tasks still queued on
/// the scheduler deliver nothing.
#[derive(Clone)]
pub struct ObserveOn<S, Sch> {
  pub(crate) source: S,
  pub(crate) scheduler: Sch,
}

impl<S, Sch> Observable for ObserveOn<S, Sch>
where
  S: Observable,
  Sch: Scheduler,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = (SubscriberHandle, S::Unsub);

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let observer = Subscriber::new(observer);
    let handle = observer.handle();
    let unsub = self
      .source
      .actual_subscribe(ObserveOnObserver { observer, scheduler: self.scheduler });
    (handle, unsub)
  }
}

pub struct ObserveOnObserver<O, Item, Err, Sch> {
  observer: Subscriber<O, Item, Err>,
  scheduler: Sch,
}

impl<O, Item, Err, Sch> ObserveOnObserver<O, Item, Err, Sch>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: 'static,
  Sch: Scheduler,
{
  fn schedule(&self, notification: Notification<Item, Err>) {
    let observer = self.observer.clone();
    // The handle is not kept: closing the subscriber already mutes the task.
    let _ = self
      .scheduler
      .schedule(move || observer.deliver(notification), None);
  }
}

impl<O, Item, Err, Sch> Observer<Item, Err> for ObserveOnObserver<O, Item, Err, Sch>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: 'static,
  Sch: Scheduler,
{
  fn next(&mut self, value: Item) { self.schedule(Notification::Next(value)) }

  fn error(self, err: Err) { self.schedule(Notification::Error(err)) }

  fn complete(self) { self.schedule(Notification::Completed) }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
