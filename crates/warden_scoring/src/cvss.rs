//! CVSS base-score calculation for v3.x and v2, per the official specifications.

use crate::types::{CvssSeverity, CvssV2, CvssV2Base, CvssV3, CvssV3Base};

/// CVSS v3.x base score per https://www.first.org/cvss/v3.1/specification-document
pub fn calculate_cvss_v3_base_score(metrics: &CvssV3Base) -> f64 {
    let isc_base = 1.0
        - ((1.0 - confidentiality_impact(&metrics.confidentiality))
            * (1.0 - integrity_impact(&metrics.integrity))
            * (1.0 - availability_impact(&metrics.availability)));

    let impact = if metrics.scope == "U" {
        6.42 * isc_base
    } else {
        7.52 * (isc_base - 0.029) - 3.25 * (isc_base - 0.02).powi(15)
    };

    let exploitability = 8.22
        * attack_vector_value(&metrics.attack_vector)
        * attack_complexity_value(&metrics.attack_complexity)
        * privileges_required_value(&metrics.privileges_required, &metrics.scope)
        * user_interaction_value(&metrics.user_interaction);

    if impact <= 0.0 {
        0.0
    } else if metrics.scope == "U" {
        roundup((impact + exploitability).min(10.0))
    } else {
        roundup((1.08 * (impact + exploitability)).min(10.0))
    }
}

pub fn parse_cvss_v3_vector(vector: &str) -> Result<CvssV3Base, String> {
    let parts: Vec<&str> = vector.split('/').collect();
    if parts.is_empty() || !parts[0].starts_with("CVSS:3") {
        return Err("invalid CVSS v3 vector string".to_string());
    }

    let mut metrics = CvssV3Base {
        attack_vector: String::new(),
        attack_complexity: String::new(),
        privileges_required: String::new(),
        user_interaction: String::new(),
        scope: String::new(),
        confidentiality: String::new(),
        integrity: String::new(),
        availability: String::new(),
    };

    for part in &parts[1..] {
        let kv: Vec<&str> = part.split(':').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "AV" => metrics.attack_vector = kv[1].to_string(),
            "AC" => metrics.attack_complexity = kv[1].to_string(),
            "PR" => metrics.privileges_required = kv[1].to_string(),
            "UI" => metrics.user_interaction = kv[1].to_string(),
            "S" => metrics.scope = kv[1].to_string(),
            "C" => metrics.confidentiality = kv[1].to_string(),
            "I" => metrics.integrity = kv[1].to_string(),
            "A" => metrics.availability = kv[1].to_string(),
            _ => {}
        }
    }

    if metrics.attack_vector.is_empty()
        || metrics.attack_complexity.is_empty()
        || metrics.privileges_required.is_empty()
        || metrics.user_interaction.is_empty()
        || metrics.scope.is_empty()
        || metrics.confidentiality.is_empty()
        || metrics.integrity.is_empty()
        || metrics.availability.is_empty()
    {
        return Err("missing required CVSS v3 metrics".to_string());
    }

    Ok(metrics)
}

pub fn cvss_v3_from_vector(vector: &str) -> Result<CvssV3, String> {
    let metrics = parse_cvss_v3_vector(vector)?;
    let base_score = calculate_cvss_v3_base_score(&metrics);
    let severity = CvssSeverity::from_v3_score(base_score);

    Ok(CvssV3 {
        base_metrics: metrics,
        base_score,
        severity,
        vector_string: vector.to_string(),
    })
}

fn attack_vector_value(av: &str) -> f64 {
    match av {
        "N" => 0.85,
        "A" => 0.62,
        "L" => 0.55,
        "P" => 0.2,
        _ => 0.0,
    }
}

fn attack_complexity_value(ac: &str) -> f64 {
    match ac {
        "L" => 0.77,
        "H" => 0.44,
        _ => 0.0,
    }
}

fn privileges_required_value(pr: &str, scope: &str) -> f64 {
    match (pr, scope) {
        ("N", _) => 0.85,
        ("L", "U") => 0.62,
        ("L", "C") => 0.68,
        ("H", "U") => 0.27,
        ("H", "C") => 0.50,
        _ => 0.0,
    }
}

fn user_interaction_value(ui: &str) -> f64 {
    match ui {
        "N" => 0.85,
        "R" => 0.62,
        _ => 0.0,
    }
}

fn confidentiality_impact(c: &str) -> f64 {
    impact_value(c)
}

fn integrity_impact(i: &str) -> f64 {
    impact_value(i)
}

fn availability_impact(a: &str) -> f64 {
    impact_value(a)
}

fn impact_value(v: &str) -> f64 {
    match v {
        "H" => 0.56,
        "L" => 0.22,
        "N" => 0.0,
        _ => 0.0,
    }
}

fn roundup(value: f64) -> f64 {
    (value * 10.0).ceil() / 10.0
}

/// CVSS v2 base score per https://www.first.org/cvss/v2/guide
pub fn calculate_cvss_v2_base_score(metrics: &CvssV2Base) -> f64 {
    let exploitability = 20.0
        * access_vector_value(&metrics.access_vector)
        * access_complexity_value(&metrics.access_complexity)
        * authentication_value(&metrics.authentication);

    let impact = 10.41
        * (1.0
            - (1.0 - v2_impact_value(&metrics.confidentiality_impact))
                * (1.0 - v2_impact_value(&metrics.integrity_impact))
                * (1.0 - v2_impact_value(&metrics.availability_impact)));

    let f_impact = if impact == 0.0 { 0.0 } else { 1.176 };

    let base = ((0.6 * impact) + (0.4 * exploitability) - 1.5) * f_impact;
    (base * 10.0).round() / 10.0
}

pub fn parse_cvss_v2_vector(vector: &str) -> Result<CvssV2Base, String> {
    let parts: Vec<&str> = vector.split('/').collect();
    if parts.is_empty() {
        return Err("invalid CVSS v2 vector string".to_string());
    }

    let mut metrics = CvssV2Base {
        access_vector: String::new(),
        access_complexity: String::new(),
        authentication: String::new(),
        confidentiality_impact: String::new(),
        integrity_impact: String::new(),
        availability_impact: String::new(),
    };

    for part in &parts {
        let kv: Vec<&str> = part.split(':').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "AV" => metrics.access_vector = expand_v2_access_vector(kv[1]),
            "AC" => metrics.access_complexity = expand_v2_access_complexity(kv[1]),
            "Au" => metrics.authentication = expand_v2_authentication(kv[1]),
            "C" => metrics.confidentiality_impact = expand_v2_impact(kv[1]),
            "I" => metrics.integrity_impact = expand_v2_impact(kv[1]),
            "A" => metrics.availability_impact = expand_v2_impact(kv[1]),
            _ => {}
        }
    }

    if metrics.access_vector.is_empty()
        || metrics.access_complexity.is_empty()
        || metrics.authentication.is_empty()
        || metrics.confidentiality_impact.is_empty()
        || metrics.integrity_impact.is_empty()
        || metrics.availability_impact.is_empty()
    {
        return Err("missing required CVSS v2 metrics".to_string());
    }

    Ok(metrics)
}

pub fn cvss_v2_from_vector(vector: &str) -> Result<CvssV2, String> {
    let metrics = parse_cvss_v2_vector(vector)?;
    let base_score = calculate_cvss_v2_base_score(&metrics);
    let severity = CvssSeverity::from_v2_score(base_score);

    Ok(CvssV2 {
        base_metrics: metrics,
        base_score,
        severity,
        vector_string: vector.to_string(),
    })
}

fn expand_v2_access_vector(code: &str) -> String {
    match code {
        "N" => "NETWORK",
        "A" => "ADJACENT_NETWORK",
        "L" => "LOCAL",
        other => other,
    }
    .to_string()
}

fn expand_v2_access_complexity(code: &str) -> String {
    match code {
        "L" => "LOW",
        "M" => "MEDIUM",
        "H" => "HIGH",
        other => other,
    }
    .to_string()
}

fn expand_v2_authentication(code: &str) -> String {
    match code {
        "N" => "NONE",
        "S" => "SINGLE",
        "M" => "MULTIPLE",
        other => other,
    }
    .to_string()
}

fn expand_v2_impact(code: &str) -> String {
    match code {
        "N" => "NONE",
        "P" => "PARTIAL",
        "C" => "COMPLETE",
        other => other,
    }
    .to_string()
}

fn access_vector_value(av: &str) -> f64 {
    match av {
        "NETWORK" => 1.0,
        "ADJACENT_NETWORK" => 0.646,
        "LOCAL" => 0.395,
        _ => 0.0,
    }
}

fn access_complexity_value(ac: &str) -> f64 {
    match ac {
        "LOW" => 0.71,
        "MEDIUM" => 0.61,
        "HIGH" => 0.35,
        _ => 0.0,
    }
}

fn authentication_value(auth: &str) -> f64 {
    match auth {
        "NONE" => 0.704,
        "SINGLE" => 0.56,
        "MULTIPLE" => 0.45,
        _ => 0.0,
    }
}

fn v2_impact_value(v: &str) -> f64 {
    match v {
        "COMPLETE" => 0.660,
        "PARTIAL" => 0.275,
        "NONE" => 0.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_scores_a_critical_v3_vector() {
        let vector = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:C/C:H/I:H/A:H";
        let cvss = cvss_v3_from_vector(vector).unwrap();
        assert_eq!(cvss.base_score, 10.0);
        assert_eq!(cvss.severity, CvssSeverity::Critical);
    }

    #[test]
    fn scores_a_high_severity_unchanged_scope_vector() {
        let vector = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H";
        let cvss = cvss_v3_from_vector(vector).unwrap();
        assert_eq!(cvss.base_score, 9.8);
        assert_eq!(cvss.severity, CvssSeverity::Critical);
    }

    #[test]
    fn rejects_a_malformed_v3_vector() {
        assert!(parse_cvss_v3_vector("not-a-vector").is_err());
    }

    #[test]
    fn scores_a_v2_critical_vector() {
        let metrics = parse_cvss_v2_vector("AV:N/AC:L/Au:N/C:C/I:C/A:C").unwrap();
        let score = calculate_cvss_v2_base_score(&metrics);
        assert!(score >= 9.0, "expected critical v2 score, got {score}");
    }

    #[test]
    fn v2_severity_bucket_matches_documented_thresholds() {
        assert_eq!(CvssSeverity::from_v2_score(9.5), CvssSeverity::Critical);
        assert_eq!(CvssSeverity::from_v2_score(7.2), CvssSeverity::High);
        assert_eq!(CvssSeverity::from_v2_score(5.0), CvssSeverity::Medium);
        assert_eq!(CvssSeverity::from_v2_score(2.0), CvssSeverity::Low);
    }
}
