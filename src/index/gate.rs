use super::*;

/// Admits one ingestion pass at a time and lets readers wait out the pass that
/// is in flight when they arrive.
#[derive(Default)]
pub(crate) struct ParseGate {
  state: Mutex<GateState>,
  finished: Condvar,
}

#[derive(Default)]
struct GateState {
  generation: u64,
  parsing: bool,
}

struct Release<'a>(&'a ParseGate);

impl Drop for Release<'_> {
  fn drop(&mut self) {
    let mut state = self.0.state.lock();
    state.parsing = false;
    state.generation = state.generation.wrapping_add(1);
    self.0.finished.notify_all();
  }
}

impl ParseGate {
  /// Run `f` unless a pass is already in flight.
  pub(crate) fn try_parse<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
    {
      let mut state = self.state.lock();
      if state.parsing {
        return None;
      }
      state.parsing = true;
    }

    let _release = Release(self);

    Some(f())
  }

  /// Run `f` once the gate is free.
  pub(crate) fn parse<T>(&self, f: impl FnOnce() -> T) -> T {
    {
      let mut state = self.state.lock();
      while state.parsing {
        self.finished.wait(&mut state);
      }
      state.parsing = true;
    }

    let _release = Release(self);

    f()
  }

  /// Block until the pass in flight at call time, if any, has finished.
  pub(crate) fn wait_for_parsing(&self) {
    let mut state = self.state.lock();

    if !state.parsing {
      return;
    }

    let generation = state.generation;

    while state.generation == generation {
      self.finished.wait(&mut state);
    }
  }

  pub(crate) fn is_parsing(&self) -> bool {
    self.state.lock().parsing
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq, std::sync::mpsc::channel};

  #[test]
  fn try_parse_skips_while_a_pass_is_in_flight() {
    let gate = Arc::new(ParseGate::default());
    let (started_tx, started_rx) = channel();
    let (release_tx, release_rx) = channel::<()>();

    let handle = {
      let gate = gate.clone();
      thread::spawn(move || {
        gate.try_parse(|| {
          started_tx.send(()).unwrap();
          release_rx.recv().unwrap();
          1
        })
      })
    };

    started_rx.recv().unwrap();

    assert!(gate.is_parsing());
    assert_eq!(gate.try_parse(|| 2), None);

    release_tx.send(()).unwrap();

    assert_eq!(handle.join().unwrap(), Some(1));
    assert!(!gate.is_parsing());
    assert_eq!(gate.try_parse(|| 3), Some(3));
  }

  #[test]
  fn wait_for_parsing_returns_immediately_when_idle() {
    let gate = ParseGate::default();
    gate.wait_for_parsing();
    assert_eq!(gate.parse(|| 1), 1);
    gate.wait_for_parsing();
  }

  #[test]
  fn wait_for_parsing_outlasts_the_pass_in_flight() {
    let gate = Arc::new(ParseGate::default());
    let done = Arc::new(AtomicBool::new(false));
    let (started_tx, started_rx) = channel();

    let parser = {
      let gate = gate.clone();
      let done = done.clone();
      thread::spawn(move || {
        gate.parse(|| {
          started_tx.send(()).unwrap();
          thread::sleep(Duration::from_millis(50));
          done.store(true, atomic::Ordering::SeqCst);
        })
      })
    };

    started_rx.recv().unwrap();

    gate.wait_for_parsing();

    assert!(done.load(atomic::Ordering::SeqCst));

    parser.join().unwrap();
  }

  #[test]
  fn blocking_parse_queues_behind_the_pass_in_flight() {
    let gate = Arc::new(ParseGate::default());
    let order = Arc::new(Mutex::new(Vec::new()));
    let (started_tx, started_rx) = channel();

    let first = {
      let gate = gate.clone();
      let order = order.clone();
      thread::spawn(move || {
        gate.parse(|| {
          started_tx.send(()).unwrap();
          thread::sleep(Duration::from_millis(50));
          order.lock().push(1);
        })
      })
    };

    started_rx.recv().unwrap();

    gate.parse(|| order.lock().push(2));

    first.join().unwrap();

    assert_eq!(*order.lock(), [1, 2]);
  }

  #[test]
  fn a_panicking_pass_releases_the_gate() {
    let gate = ParseGate::default();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
      gate.try_parse(|| panic!("pass failed"))
    }));

    assert!(result.is_err());
    assert!(!gate.is_parsing());
    assert_eq!(gate.try_parse(|| 1), Some(1));
  }
}
