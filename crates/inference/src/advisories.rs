use shared::protocol::{Advisory, AlertSeverity};

const ADVISORIES: &[(&str, AlertSeverity, &str)] = &[
    (
        "Seasonal dengue surge expected",
        AlertSeverity::Critical,
        "Monsoon conditions historically raise dengue admissions within three weeks. \
         Reserve isolation beds in General Medicine and confirm platelet and IV fluid stock.",
    ),
    (
        "Respiratory infections trending up",
        AlertSeverity::Warning,
        "Paediatric respiratory visits typically peak as temperatures drop. \
         Review nebuliser availability and antibiotic stock for the CHILD age group protocols.",
    ),
    (
        "Heat-related illness watch",
        AlertSeverity::Warning,
        "Heatwave advisories increase dehydration and heatstroke cases among OLDER patients. \
         Keep oral rehydration salts and IV fluids above minimum stock levels.",
    ),
    (
        "Routine stock review",
        AlertSeverity::Info,
        "Check inventory batches expiring within 30 days and rotate them to high-turnover wards.",
    ),
];

/// Fixed advisory blocks shown on the alerts panel regardless of whether a
/// prediction endpoint is configured.
pub fn static_advisories() -> Vec<Advisory> {
    ADVISORIES
        .iter()
        .map(|(title, severity, body)| Advisory {
            title: (*title).to_string(),
            severity: *severity,
            body: (*body).to_string(),
        })
        .collect()
}
