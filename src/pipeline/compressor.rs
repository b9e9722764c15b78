//! Representation fidelity for significant moments
//!
//! One call over the whole run's moments, since fidelity is a judgement
//! relative to everything else that happened that day.

use super::state::CompressionArtifact;
use crate::lens::{Bindings, CompressionResponse, LensRunner, Moment, PromptTemplate, Traced};
use serde_json::json;

pub struct Compressor;

impl Compressor {
    /// Ask for one representation per moment, in moment order.
    ///
    /// A failed or malformed call leaves the representation set empty and
    /// marks the artifact as undetermined.
    pub async fn compress(
        runner: &LensRunner,
        template: &PromptTemplate,
        moments: &[Traced<Moment>],
    ) -> CompressionArtifact {
        let items: Vec<&Moment> = moments.iter().map(|m| &m.item).collect();
        let input = format!("{:#}", json!({ "moments": items }));
        let prompt = template.render(&Bindings::new(), &input);

        let (response, status) = runner
            .run::<CompressionResponse>(template.lens(), &prompt)
            .await
            .into_parts();
        let artifact = CompressionArtifact::from_response(response, moments.len(), status);

        if artifact.status.is_ok() && artifact.representations.len() != moments.len() {
            tracing::warn!(
                expected = moments.len(),
                returned = artifact.representations.len(),
                "Compression returned a different number of representations"
            );
        }
        artifact
    }
}
