//! Departments the operator can pick from, spelled exactly as the portal's
//! department search expects them.

pub const SELECTABLE_DEPARTMENTS: &[&str] = &[
    "Department of Radiation Oncology",
    "Department of Speech - Language Pathology",
    "Department of Medical Biophysics",
    "Department of Obstetrics And Gynaecology",
    "Laboratory Medicine And Pathobiology",
    "Department of Pharmacology",
    "Discovery Commons",
    "Graduate Department of Rehabilitation Science",
    "Department of Occupational Science & Therapy",
    "Department of Biochemistry",
    "Division of Comparative Medicine",
    "Med: Office of The Dean",
    "Department of Nutritional Sciences",
    "Banting & Best Diabetes Centre",
    "Division of Teaching Laboratories",
    "Division of (Department of Surgery) Anatomy",
    "Department of Otolaryngology - Head & Neck Surgery",
    "Postgraduate Medical Education",
    "Standardized Patient Program",
    "History of Medicine Program",
    "Department of Anesthesiology & Pain Medicine",
    "Faculty of Medicine",
    "Med Store",
    "Department of Physiology",
    "Rehabilitation Sciences Sector",
    "Terrence Donnelly Centre for Cellular and Biomolecular Research",
    "Molecular Genetics",
    "Level 3 Facility",
    "Department of Ophthalmology & Vision Sciences",
    "Department of Immunology",
    "Department of Medical Imaging",
    "Department of Physical Therapy",
    "Structural Genomics Consortium",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_has_no_duplicates() {
        let unique: HashSet<_> = SELECTABLE_DEPARTMENTS.iter().collect();
        assert_eq!(unique.len(), SELECTABLE_DEPARTMENTS.len());
        assert_eq!(SELECTABLE_DEPARTMENTS.len(), 33);
    }
}
