// Copyright 2018-2026 the Deno authors. MIT license.

use std::rc::Rc;

use crate::record::TimerRecord;

/// Dense, unordered pool of the records currently watched by the engine.
///
/// Slot order carries no meaning. Removal swaps the doomed slot with the last
/// live slot of the range being scanned, so a pass stays linear in the number
/// of watched records.
#[derive(Debug, Default)]
pub(crate) struct ActiveSet {
  slots: Vec<Rc<TimerRecord>>,
}

impl ActiveSet {
  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn push(&mut self, record: Rc<TimerRecord>) {
    self.slots.push(record);
  }

  pub fn get(&self, index: usize) -> Option<Rc<TimerRecord>> {
    self.slots.get(index).cloned()
  }

  /// Move the record at `index` into the dead tail at `last`, pulling the
  /// record at `last` into `index`.
  pub fn swap_out(&mut self, index: usize, last: usize) {
    self.slots.swap(index, last);
  }

  /// Drop the slots swept by a pass. `live..scanned` holds the swept records;
  /// anything past `scanned` was pushed while the pass ran and is kept.
  pub fn finish_pass(&mut self, live: usize, scanned: usize) {
    drop(self.slots.drain(live..scanned));
  }

  pub fn drain(&mut self) -> impl Iterator<Item = Rc<TimerRecord>> + '_ {
    self.slots.drain(..)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn records(n: u64) -> Vec<Rc<TimerRecord>> {
    (0..n)
      .map(|delay| Rc::new(TimerRecord::new(delay, Box::new(|| {}))))
      .collect()
  }

  fn delays(set: &ActiveSet) -> Vec<u64> {
    (0..set.len())
      .map(|i| set.get(i).unwrap().delay_ms())
      .collect()
  }

  #[test]
  fn swap_out_then_finish_keeps_late_pushes() {
    let mut set = ActiveSet::default();
    let all = records(5);
    for record in &all[..4] {
      set.push(record.clone());
    }
    // Remove slot 1 from a scan over the first four slots.
    set.swap_out(1, 3);
    // A record pushed mid-pass lands after the scanned range.
    set.push(all[4].clone());
    set.finish_pass(3, 4);
    assert_eq!(delays(&set), vec![0, 3, 2, 4]);
  }

  #[test]
  fn drain_empties() {
    let mut set = ActiveSet::default();
    for record in records(3) {
      set.push(record);
    }
    assert_eq!(set.drain().count(), 3);
    assert_eq!(set.len(), 0);
    assert_eq!(set.get(0).map(|r| r.delay_ms()), None);
  }
}
