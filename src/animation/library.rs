// Registry of shared motions, keyed by name

use super::motion::{MixMap, Motion};
use crate::error::MotionError;
use crate::model::LoopMode;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Owns every loaded clip and caches mix results per (source, target) pair
#[derive(Debug, Default)]
pub struct MotionLibrary {
    motions: BTreeMap<String, Rc<Motion>>,
    mixes: HashMap<(String, String), Rc<MixMap>>,
    plot_dir: Option<PathBuf>,
}

impl MotionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export mix diagnostics into `dir` whenever a new pair is mixed
    pub fn with_plot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.plot_dir = dir;
        self
    }

    pub fn add(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        loop_mode: LoopMode,
        steps: u32,
    ) -> Result<Rc<Motion>, MotionError> {
        let motion = Motion::create(name, path, loop_mode, steps)?;
        Ok(self.insert(motion))
    }

    /// Load a clip that blends against the already registered `link`
    pub fn add_linked(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        loop_mode: LoopMode,
        steps: u32,
        link: &str,
    ) -> Result<Rc<Motion>, MotionError> {
        let target = self.require(link)?;
        let mut motion = Motion::create(name, path, loop_mode, steps)?;
        motion.link(&target);
        Ok(self.insert(motion))
    }

    /// Register a motion under its own name, replacing any previous clip
    pub fn insert(&mut self, motion: Motion) -> Rc<Motion> {
        let name = motion.name.clone();
        let motion = Rc::new(motion);
        if self.motions.insert(name.clone(), Rc::clone(&motion)).is_some() {
            log::debug!("Replacing motion '{name}'");
            self.mixes.retain(|(a, b), _| *a != name && *b != name);
        }
        motion
    }

    pub fn get(&self, name: &str) -> Option<Rc<Motion>> {
        self.motions.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.motions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    /// Mix `from` into `to`, reusing an earlier result for the same pair
    pub fn mix(&mut self, from: &str, to: &str) -> Result<Rc<MixMap>, MotionError> {
        let key = (from.to_string(), to.to_string());
        if let Some(mm) = self.mixes.get(&key) {
            return Ok(Rc::clone(mm));
        }

        let source = self.require(from)?;
        let target = self.require(to)?;
        let mm = Rc::new(source.mix(&target, self.plot_dir.as_deref()));
        self.mixes.insert(key, Rc::clone(&mm));
        Ok(mm)
    }

    fn require(&self, name: &str) -> Result<Rc<Motion>, MotionError> {
        self.get(name)
            .ok_or_else(|| MotionError::new("unknown-motion").with_arg("name", name))
    }
}
