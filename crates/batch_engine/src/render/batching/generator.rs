//! # Batch Generator
//!
//! Accumulates items into the currently open batch and decides, one item at a
//! time, whether the next item still fits:
//!
//! - **Pipeline State**: must equal the state recorded by the first member
//! - **Texture Units**: net-new textures must fit the remaining unit budget
//! - **Uniform Buffer**: a new distinct uniform set must fit the buffer size
//! - **Admission Policy**: a user predicate gets the final say
//!
//! Admission is all-or-nothing. A rejected item leaves the open batch untouched.

use std::collections::HashMap;
use std::mem;

use crate::core::config::BatcherConfig;
use crate::render::item::{BatchItem, UniformValue};
use crate::render::layout::UniformRedirect;
use crate::render::pipeline::PipelineState;
use crate::render::texture::TextureId;

use super::batch::Batch;

/// User-extensible admission predicate for the open batch
///
/// Consulted only after the built-in state, texture and uniform checks pass,
/// and never for the first member of a batch.
pub trait AdmissionPolicy<I: ?Sized> {
    /// Whether `item` may join a batch that already has `batch_len` members
    fn admit(&self, item: &I, batch_len: usize) -> bool;

    /// Called when `item` joins the open batch
    fn accepted(&mut self, _item: &I) {}

    /// Called when the open batch is finalized
    fn reset(&mut self) {}
}

/// Admits every item
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<I: ?Sized> AdmissionPolicy<I> for AcceptAll {
    fn admit(&self, _item: &I, _batch_len: usize) -> bool {
        true
    }
}

/// Caps the number of items per batch
#[derive(Debug, Clone, Copy)]
pub struct MaxItemsPolicy {
    max_items: usize,
}

impl MaxItemsPolicy {
    /// Create a policy admitting at most `max_items` members per batch
    pub const fn new(max_items: usize) -> Self {
        Self { max_items }
    }
}

impl<I: ?Sized> AdmissionPolicy<I> for MaxItemsPolicy {
    fn admit(&self, _item: &I, batch_len: usize) -> bool {
        batch_len < self.max_items
    }
}

impl<I: ?Sized, F> AdmissionPolicy<I> for F
where
    F: Fn(&I, usize) -> bool,
{
    fn admit(&self, item: &I, batch_len: usize) -> bool {
        self(item, batch_len)
    }
}

/// Where an admitted item's uniform set lives
enum UniformSlot {
    Existing(u32),
    New,
}

/// Accumulates the open batch
pub struct BatchGenerator<I: ?Sized> {
    texture_unit_budget: usize,
    texture_reduction: bool,
    uniform_redirects: Vec<UniformRedirect>,
    uniform_buffer_size: Option<usize>,
    policy: Box<dyn AdmissionPolicy<I>>,

    state: Option<PipelineState>,
    members: Vec<usize>,
    textures: Vec<TextureId>,
    texture_units: HashMap<TextureId, u32>,
    member_units: Vec<u32>,
    member_unit_offsets: Vec<usize>,
    uniforms: Vec<Vec<UniformValue>>,
    member_uniform_ids: Vec<u32>,

    new_textures: Vec<TextureId>,
    pending_uniforms: Vec<UniformValue>,
}

impl<I: BatchItem + ?Sized> BatchGenerator<I> {
    /// Create a generator with the built-in policy implied by `config`
    pub fn new(config: &BatcherConfig) -> Self {
        let policy: Box<dyn AdmissionPolicy<I>> = match config.max_items_per_batch {
            Some(max) => Box::new(MaxItemsPolicy::new(max as usize)),
            None => Box::new(AcceptAll),
        };
        Self::with_policy(config, policy)
    }

    /// Create a generator with a custom admission policy
    pub fn with_policy(config: &BatcherConfig, policy: Box<dyn AdmissionPolicy<I>>) -> Self {
        Self {
            texture_unit_budget: config.texture_unit_budget as usize,
            texture_reduction: config.texture_reduction,
            uniform_redirects: config.uniforms.clone(),
            uniform_buffer_size: config.uniform_buffer_size.map(|size| size as usize),
            policy,
            state: None,
            members: Vec::new(),
            textures: Vec::new(),
            texture_units: HashMap::new(),
            member_units: Vec::new(),
            member_unit_offsets: vec![0],
            uniforms: Vec::new(),
            member_uniform_ids: Vec::new(),
            new_textures: Vec::new(),
            pending_uniforms: Vec::new(),
        }
    }

    /// Replace the admission policy
    pub fn set_policy(&mut self, policy: Box<dyn AdmissionPolicy<I>>) {
        self.policy = policy;
    }

    /// Try to add the item at stream position `index` to the open batch
    ///
    /// The first item of an empty batch is always accepted and fixes the
    /// batch's pipeline state.
    pub fn put(&mut self, index: usize, item: &I, state: PipelineState) -> bool {
        let first = self.members.is_empty();

        if !first && self.state != Some(state) {
            return false;
        }

        self.count_new_textures(item);
        if !first && self.textures.len() + self.new_textures.len() > self.texture_unit_budget {
            return false;
        }

        let uniform_slot = if self.uniform_redirects.is_empty() {
            None
        } else {
            self.gather_uniforms(item);
            match self.uniforms.iter().position(|set| *set == self.pending_uniforms) {
                Some(existing) => Some(UniformSlot::Existing(existing as u32)),
                None if !first
                    && self
                        .uniform_buffer_size
                        .is_some_and(|size| self.uniforms.len() >= size) =>
                {
                    return false;
                }
                None => Some(UniformSlot::New),
            }
        };

        if !first && !self.policy.admit(item, self.members.len()) {
            return false;
        }

        if first {
            self.state = Some(state);
        }
        self.members.push(index);
        self.register_textures(item);

        match uniform_slot {
            Some(UniformSlot::Existing(id)) => self.member_uniform_ids.push(id),
            Some(UniformSlot::New) => {
                self.member_uniform_ids.push(self.uniforms.len() as u32);
                self.uniforms.push(mem::take(&mut self.pending_uniforms));
            }
            None => {}
        }

        self.policy.accepted(item);
        true
    }

    /// Move the open batch into `out` and start a new one
    ///
    /// Callers must only finalize a non-empty generator.
    pub fn finalize(&mut self, out: &mut Batch) {
        debug_assert!(!self.members.is_empty(), "finalizing an empty batch");

        out.reset();
        mem::swap(&mut out.members, &mut self.members);
        mem::swap(&mut out.textures, &mut self.textures);
        mem::swap(&mut out.texture_units, &mut self.texture_units);
        mem::swap(&mut out.member_units, &mut self.member_units);
        mem::swap(&mut out.member_unit_offsets, &mut self.member_unit_offsets);
        mem::swap(&mut out.uniforms, &mut self.uniforms);
        mem::swap(&mut out.member_uniform_ids, &mut self.member_uniform_ids);
        out.pipeline_state = self.state.take().unwrap_or_default();

        self.member_unit_offsets.push(0);
        self.policy.reset();
    }

    /// Number of items in the open batch
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the open batch has no items
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Distinct textures bound by the open batch
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Collect the units `item` would newly consume into `new_textures`
    fn count_new_textures(&mut self, item: &I) {
        self.new_textures.clear();
        for &texture in item.textures() {
            if !self.texture_reduction {
                self.new_textures.push(texture);
            } else if !self.texture_units.contains_key(&texture)
                && !self.new_textures.contains(&texture)
            {
                self.new_textures.push(texture);
            }
        }
    }

    fn register_textures(&mut self, item: &I) {
        for &texture in item.textures() {
            let unit = match self.texture_units.get(&texture) {
                Some(&unit) if self.texture_reduction => unit,
                _ => {
                    let unit = self.textures.len() as u32;
                    self.textures.push(texture);
                    self.texture_units.entry(texture).or_insert(unit);
                    unit
                }
            };
            self.member_units.push(unit);
        }
        self.member_unit_offsets.push(self.member_units.len());
    }

    fn gather_uniforms(&mut self, item: &I) {
        self.pending_uniforms.clear();
        for redirect in &self.uniform_redirects {
            if let Some(value) = item.uniform(&redirect.source) {
                self.pending_uniforms.push(value);
            }
        }
    }
}
