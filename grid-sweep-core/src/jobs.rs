//! Enumerates the cartesian job space of a sweep.
//!
//! Order is clip skip (outer), seed (middle), prompt set (inner), each in the
//! order supplied. Console progress follows this order, so it must not change.

use crate::prompt_set::PromptSet;

/// One (clip skip, seed, prompt set) combination. Consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job<'a> {
    pub clip_skip: u32,
    pub seed: i64,
    pub prompt_set: &'a PromptSet,
}

impl<'a> Job<'a> {
    pub fn folder(&self) -> &'a str {
        &self.prompt_set.folder
    }

    /// Number of images this job is expected to save.
    pub fn expected_images(&self) -> usize {
        self.prompt_set.fragment_count()
    }
}

/// The job space over borrowed run parameters.
#[derive(Debug, Clone, Copy)]
pub struct JobPlan<'a> {
    clip_skips: &'a [u32],
    seeds: &'a [i64],
    prompt_sets: &'a [PromptSet],
}

impl<'a> JobPlan<'a> {
    pub fn new(clip_skips: &'a [u32], seeds: &'a [i64], prompt_sets: &'a [PromptSet]) -> Self {
        Self {
            clip_skips,
            seeds,
            prompt_sets,
        }
    }

    /// (sum of fragment counts) x seeds x clip skips.
    pub fn total_images(&self) -> usize {
        let fragments: usize = self.prompt_sets.iter().map(PromptSet::fragment_count).sum();
        fragments * self.seeds.len() * self.clip_skips.len()
    }

    pub fn total_jobs(&self) -> usize {
        self.prompt_sets.len() * self.seeds.len() * self.clip_skips.len()
    }

    pub fn jobs(&self) -> impl Iterator<Item = Job<'a>> + 'a {
        let clip_skips = self.clip_skips;
        let seeds = self.seeds;
        let prompt_sets = self.prompt_sets;
        clip_skips.iter().flat_map(move |&clip_skip| {
            seeds.iter().flat_map(move |&seed| {
                prompt_sets.iter().map(move |prompt_set| Job {
                    clip_skip,
                    seed,
                    prompt_set,
                })
            })
        })
    }
}
