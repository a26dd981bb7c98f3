//! In-memory display server used by tests. Implements every sys port over
//! one shared state so a scripted topology, injected failures, and recorded
//! calls are all visible through the same handle the engine is driving.

use std::sync::Arc;

use parking_lot::Mutex;

use super::arrangement::ArrangementCache;
use super::gamma::GammaControl;
use super::screen::{DisplayId, DisplayQuery};
use super::settings::SettingsStore;
use super::transaction::{ConfigSession, ConfigTransaction};
use super::{SysError, SysPorts};
use crate::common::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StagedOp {
    SetOutput(DisplayId, bool),
    SetMirror(DisplayId, Option<DisplayId>),
}

#[derive(Default)]
struct FakeState {
    online: Vec<DisplayId>,
    active: HashSet<DisplayId>,
    builtin: HashSet<DisplayId>,
    names: HashMap<DisplayId, String>,
    primary: Option<DisplayId>,
    mirror_sources: HashMap<DisplayId, DisplayId>,
    remembered_builtin: Option<DisplayId>,

    fail_begin: bool,
    fail_set_output: bool,
    fail_set_mirror: bool,
    fail_complete: bool,
    fail_gamma: bool,
    fail_snapshot: bool,
    fail_arrangement_restore: bool,

    open_transactions: u32,
    completed_transactions: u32,
    cancelled_transactions: u32,
    output_calls: Vec<(DisplayId, bool)>,
    mirror_calls: Vec<(DisplayId, Option<DisplayId>)>,
    zeroed: Vec<DisplayId>,
    restored: Vec<DisplayId>,
    restore_all_calls: u32,
    snapshots: u32,
    arrangement_restores: u32,
    permanent_restores: u32,
}

#[derive(Clone)]
pub struct FakeDisplayServer {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDisplayServer {
    pub fn new() -> Self {
        FakeDisplayServer {
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub fn ports(&self) -> SysPorts {
        SysPorts {
            query: Arc::new(self.clone()),
            session: Arc::new(self.clone()),
            gamma: Arc::new(self.clone()),
            arrangement: Arc::new(self.clone()),
            settings: Arc::new(self.clone()),
        }
    }

    // -- topology scripting --

    pub fn attach(&self, id: DisplayId, name: &str, builtin: bool) {
        let mut state = self.state.lock();
        if !state.online.contains(&id) {
            state.online.push(id);
        }
        state.active.insert(id);
        state.names.insert(id, name.to_string());
        if builtin {
            state.builtin.insert(id);
        }
        if state.primary.is_none() {
            state.primary = Some(id);
        }
    }

    pub fn detach(&self, id: DisplayId) {
        let mut state = self.state.lock();
        state.online.retain(|other| *other != id);
        state.active.remove(&id);
        if state.primary == Some(id) {
            state.primary = None;
        }
    }

    pub fn set_primary(&self, id: DisplayId) {
        self.state.lock().primary = Some(id);
    }

    pub fn set_active(&self, id: DisplayId, active: bool) {
        let mut state = self.state.lock();
        if active {
            state.active.insert(id);
        } else {
            state.active.remove(&id);
        }
    }

    pub fn is_active(&self, id: DisplayId) -> bool {
        self.state.lock().active.contains(&id)
    }

    pub fn mirror_source_of(&self, id: DisplayId) -> Option<DisplayId> {
        self.state.lock().mirror_sources.get(&id).copied()
    }

    // -- failure injection --

    pub fn fail_begin(&self, fail: bool) {
        self.state.lock().fail_begin = fail;
    }

    pub fn fail_set_output(&self, fail: bool) {
        self.state.lock().fail_set_output = fail;
    }

    pub fn fail_set_mirror(&self, fail: bool) {
        self.state.lock().fail_set_mirror = fail;
    }

    pub fn fail_complete(&self, fail: bool) {
        self.state.lock().fail_complete = fail;
    }

    pub fn fail_gamma(&self, fail: bool) {
        self.state.lock().fail_gamma = fail;
    }

    pub fn fail_snapshot(&self, fail: bool) {
        self.state.lock().fail_snapshot = fail;
    }

    pub fn fail_arrangement_restore(&self, fail: bool) {
        self.state.lock().fail_arrangement_restore = fail;
    }

    // -- recorded calls --

    pub fn open_transactions(&self) -> u32 {
        self.state.lock().open_transactions
    }

    pub fn completed_transactions(&self) -> u32 {
        self.state.lock().completed_transactions
    }

    pub fn cancelled_transactions(&self) -> u32 {
        self.state.lock().cancelled_transactions
    }

    pub fn output_calls(&self) -> Vec<(DisplayId, bool)> {
        self.state.lock().output_calls.clone()
    }

    pub fn mirror_calls(&self) -> Vec<(DisplayId, Option<DisplayId>)> {
        self.state.lock().mirror_calls.clone()
    }

    pub fn zeroed(&self) -> Vec<DisplayId> {
        self.state.lock().zeroed.clone()
    }

    pub fn restored(&self) -> Vec<DisplayId> {
        self.state.lock().restored.clone()
    }

    pub fn restore_all_calls(&self) -> u32 {
        self.state.lock().restore_all_calls
    }

    pub fn snapshot_count(&self) -> u32 {
        self.state.lock().snapshots
    }

    pub fn arrangement_restore_count(&self) -> u32 {
        self.state.lock().arrangement_restores
    }

    pub fn permanent_restore_count(&self) -> u32 {
        self.state.lock().permanent_restores
    }
}

impl Default for FakeDisplayServer {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayQuery for FakeDisplayServer {
    fn active_displays(&self) -> Vec<DisplayId> {
        let state = self.state.lock();
        state.online.iter().copied().filter(|id| state.active.contains(id)).collect()
    }

    fn online_displays(&self) -> Vec<DisplayId> {
        self.state.lock().online.clone()
    }

    fn primary_display(&self) -> Option<DisplayId> {
        self.state.lock().primary
    }

    fn is_builtin(&self, id: DisplayId) -> bool {
        self.state.lock().builtin.contains(&id)
    }

    fn display_name(&self, id: DisplayId) -> Option<String> {
        let state = self.state.lock();
        if !state.active.contains(&id) {
            return None;
        }
        state.names.get(&id).cloned()
    }
}

struct FakeTransaction {
    state: Arc<Mutex<FakeState>>,
    staged: Vec<StagedOp>,
    closed: bool,
}

impl FakeTransaction {
    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.lock().open_transactions -= 1;
        }
    }
}

impl ConfigTransaction for FakeTransaction {
    fn set_output_enabled(&mut self, id: DisplayId, enabled: bool) -> Result<(), SysError> {
        let mut state = self.state.lock();
        state.output_calls.push((id, enabled));
        if state.fail_set_output {
            return Err(SysError::new("cannot configure display output"));
        }
        drop(state);
        self.staged.push(StagedOp::SetOutput(id, enabled));
        Ok(())
    }

    fn set_mirror_source(
        &mut self,
        id: DisplayId,
        source: Option<DisplayId>,
    ) -> Result<(), SysError> {
        let mut state = self.state.lock();
        state.mirror_calls.push((id, source));
        if state.fail_set_mirror {
            return Err(SysError::new("cannot configure mirroring"));
        }
        drop(state);
        self.staged.push(StagedOp::SetMirror(id, source));
        Ok(())
    }

    fn complete(mut self: Box<Self>) -> Result<(), SysError> {
        self.close();
        let mut state = self.state.lock();
        if state.fail_complete {
            return Err(SysError::new("configuration could not be applied"));
        }
        for op in self.staged.drain(..) {
            match op {
                StagedOp::SetOutput(id, true) => {
                    if state.online.contains(&id) {
                        state.active.insert(id);
                    }
                }
                StagedOp::SetOutput(id, false) => {
                    state.active.remove(&id);
                }
                // A mirrored display stays online but stops reporting active.
                StagedOp::SetMirror(id, Some(source)) => {
                    state.mirror_sources.insert(id, source);
                    state.active.remove(&id);
                }
                StagedOp::SetMirror(id, None) => {
                    state.mirror_sources.remove(&id);
                    if state.online.contains(&id) {
                        state.active.insert(id);
                    }
                }
            }
        }
        state.completed_transactions += 1;
        Ok(())
    }

    fn cancel(mut self: Box<Self>) {
        self.close();
        self.state.lock().cancelled_transactions += 1;
    }
}

impl ConfigSession for FakeDisplayServer {
    fn begin(&self) -> Result<Box<dyn ConfigTransaction>, SysError> {
        let mut state = self.state.lock();
        if state.fail_begin {
            return Err(SysError::new("cannot begin display configuration"));
        }
        state.open_transactions += 1;
        Ok(Box::new(FakeTransaction {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
            closed: false,
        }))
    }

    fn restore_permanent_config(&self) -> Result<(), SysError> {
        self.state.lock().permanent_restores += 1;
        Ok(())
    }
}

impl GammaControl for FakeDisplayServer {
    fn zero(&self, id: DisplayId) -> Result<(), SysError> {
        let mut state = self.state.lock();
        if state.fail_gamma {
            return Err(SysError::new("cannot set gamma table"));
        }
        state.zeroed.push(id);
        Ok(())
    }

    fn restore(&self, id: DisplayId) -> Result<(), SysError> {
        let mut state = self.state.lock();
        if state.fail_gamma {
            return Err(SysError::new("cannot restore gamma table"));
        }
        state.restored.push(id);
        Ok(())
    }

    fn restore_all(&self) {
        self.state.lock().restore_all_calls += 1;
    }
}

impl ArrangementCache for FakeDisplayServer {
    fn snapshot(&self) -> Result<(), SysError> {
        let mut state = self.state.lock();
        if state.fail_snapshot {
            return Err(SysError::new("cannot read display bounds"));
        }
        state.snapshots += 1;
        Ok(())
    }

    fn restore(&self) -> Result<(), SysError> {
        let mut state = self.state.lock();
        if state.fail_arrangement_restore {
            return Err(SysError::new("cannot move displays"));
        }
        state.arrangement_restores += 1;
        Ok(())
    }
}

impl SettingsStore for FakeDisplayServer {
    fn remembered_builtin(&self) -> Option<DisplayId> {
        self.state.lock().remembered_builtin
    }

    fn remember_builtin(&self, id: DisplayId) {
        self.state.lock().remembered_builtin = Some(id);
    }
}
