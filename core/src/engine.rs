//! The conversion engine. Turns a parameter space into stored instances.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Expand the space into points.
//!   2. For each point: record the point, then generate and record
//!      `instances_per_point` instances.
//!
//! RULES:
//!   - Every instance is built from its own RNG stream, numbered in
//!     generation order across the whole conversion.
//!   - An instance is only stored after it validates; a failed build
//!     aborts the conversion.

use crate::{
    error::{GenError, GenResult},
    exchange::{Exchange, IdOffsets},
    exec_params::ExecParams,
    request_builder::ReactorRequestBuilder,
    rng::RngBank,
    sampler::ReactorRequestSampler,
    solver::Solver,
    space::SamplerSpace,
    store::{InstanceRecord, InstanceStore},
};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionSummary {
    pub points:       usize,
    pub instance_ids: Vec<Uuid>,
}

pub struct InstanceEngine {
    pub rng_bank: RngBank,
    next_stream:  u64,
    store:        InstanceStore,
}

impl InstanceEngine {
    pub fn new(seed: u64, store: InstanceStore) -> Self {
        Self {
            rng_bank: RngBank::new(seed),
            next_stream: 0,
            store,
        }
    }

    /// An engine over a fresh, migrated in-memory store.
    pub fn build_test(seed: u64) -> GenResult<Self> {
        let store = InstanceStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(seed, store))
    }

    pub fn store(&self) -> &InstanceStore {
        &self.store
    }

    /// Generate one instance on the stream `stream`. Does not touch the store.
    pub fn generate(
        &self,
        sampler: &ReactorRequestSampler,
        offsets: IdOffsets,
        stream: u64,
    ) -> GenResult<ExecParams> {
        let rng = self.rng_bank.stream(stream);
        let mut builder = ReactorRequestBuilder::new(sampler.clone(), offsets, rng)?;
        let mut exchange = Exchange::new();
        exchange.build_from(&mut builder)?;
        let params = exchange.into_params();

        params.validate()?;
        if let Some(node) = params.orphan_request_nodes().first() {
            return Err(GenError::OrphanRequest { node: *node });
        }
        Ok(params)
    }

    /// Generate and record every instance of every point in `space`.
    pub fn convert(
        &mut self,
        space: &SamplerSpace,
        instances_per_point: usize,
        offsets: IdOffsets,
    ) -> GenResult<ConversionSummary> {
        let points = space.points()?;
        let mut summary = ConversionSummary {
            points: points.len(),
            instance_ids: Vec::with_capacity(points.len() * instances_per_point),
        };

        for (i, sampler) in points.iter().enumerate() {
            let param_id = Uuid::new_v4();
            self.store.record_point(&param_id, sampler)?;

            for _ in 0..instances_per_point {
                let stream = self.next_stream;
                self.next_stream += 1;
                let params = self.generate(sampler, offsets, stream)?;
                let record = InstanceRecord {
                    inst_id: Uuid::new_v4(),
                    param_id,
                    seed: self.rng_bank.master_seed(),
                    stream,
                    params,
                };
                self.store.record_instance(&record)?;
                summary.instance_ids.push(record.inst_id);
            }
            log::info!(
                "convert: point {}/{} recorded with {instances_per_point} instances",
                i + 1,
                points.len()
            );
        }
        Ok(summary)
    }

    /// Solve a stored instance and record the solution. Returns its id.
    pub fn solve(&self, inst_id: &Uuid, solver: &dyn Solver) -> GenResult<Uuid> {
        let record = self.store.read_instance(inst_id)?;
        let solution = solver.solve(&record.params)?;
        let soln_id = Uuid::new_v4();
        self.store
            .record_solution(&soln_id, inst_id, solver.kind(), &solution)?;
        log::info!(
            "solve: instance {inst_id} with {} in {:.3}s, objective {}",
            solver.kind(),
            solution.time,
            solution.objective
        );
        Ok(soln_id)
    }
}
