//! Assembles a `VulnerabilityScore` out of whatever sub-records the
//! configured sources returned, then runs the composite-score and
//! priority/urgency ladders over it.

use warden_core::CveId;
use warden_scoring::scoring::assemble;
use warden_scoring::{EpssInfo, KevInfo, SsvcInfo, VulnerabilityScore};
use warden_sources::NvdRecord;

/// `kev` is `None` when the catalog itself was unavailable this scan (not
/// merely a clean miss — see `ScanContext::kev_catalog`). `ssvc` is `None`
/// when every other source was also unavailable: the local SSVC stub is
/// only attached alongside at least one other determined signal, so a
/// detection where every external source genuinely failed yields a score
/// with every sub-record absent and composite `0.0` (see invariant 2).
pub fn build_score(
    cve_id: CveId,
    nvd: Option<NvdRecord>,
    kev: Option<KevInfo>,
    epss: Option<EpssInfo>,
    ssvc: Option<SsvcInfo>,
) -> VulnerabilityScore {
    let mut score = VulnerabilityScore::new(cve_id);

    if let Some(record) = nvd {
        score.description = record.description;
        score.published_date = record.published;
        score.last_modified = record.last_modified;
        score.cwe_ids = record.cwe_ids;
        score.cvss_v3_1 = record.cvss_v3_1;
        score.cvss_v3_0 = record.cvss_v3_0;
        score.cvss_v2 = record.cvss_v2;
    }

    score.kev = kev;
    score.epss = epss;
    score.ssvc = ssvc;

    assemble(&mut score);
    score
}
