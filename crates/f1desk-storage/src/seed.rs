//! Literal seed data loaded at startup.

use chrono::Utc;

use f1desk_core::types::{NewNotification, NewQaEntry, Priority};

/// Curated Q&A entries, in the order they are inserted.
pub fn seed_questions() -> Vec<NewQaEntry> {
    vec![
        NewQaEntry::new(
            "Can I work off-campus with an F1 visa?",
            "F1 students can only work off-campus through authorized programs like CPT or OPT. \
             On-campus work is limited to 20 hours/week during semesters.",
            "work",
        ),
        NewQaEntry::new(
            "What is the minimum credit requirement?",
            "F1 students must maintain full-time enrollment with at least 12 credits for \
             undergraduates or 9 credits for graduates per semester.",
            "academic",
        ),
        NewQaEntry::new(
            "What is OPT?",
            "Optional Practical Training (OPT) is temporary employment directly related to your \
             major. You can apply for up to 12 months of OPT, before or after completing your \
             studies, and STEM graduates may qualify for a 24-month extension.",
            "work",
        ),
        NewQaEntry::new(
            "What is CPT?",
            "Curricular Practical Training (CPT) is work authorization for internships or \
             co-ops that are an integral part of your curriculum. It is authorized by your DSO \
             and noted on your I-20.",
            "work",
        ),
        NewQaEntry::new(
            "How many online classes can I take?",
            "F1 students may count only one online or distance-learning class (up to 3 credits) \
             toward the full-time enrollment requirement each semester.",
            "academic",
        ),
        NewQaEntry::new(
            "Can I travel outside the US during my program?",
            "Yes. Before traveling, make sure your passport is valid, your visa is unexpired, \
             and your I-20 has a DSO travel signature issued within the last 12 months.",
            "travel",
        ),
        NewQaEntry::new(
            "What documents do I need to re-enter the US?",
            "Carry a valid passport, a valid F1 visa stamp, an I-20 with a recent travel \
             signature, and proof of financial support and enrollment.",
            "travel",
        ),
        NewQaEntry::new(
            "What is the grace period after graduation?",
            "After completing your program you have a 60-day grace period to leave the US, \
             change status, transfer schools, or begin OPT.",
            "academic",
        ),
    ]
}

/// Notices shown on the notification board.
pub fn seed_notifications() -> Vec<NewNotification> {
    let now = Utc::now();
    vec![
        NewNotification {
            title: "OPT Application Deadline".to_string(),
            content: "Submit your OPT application 90 days before your program end date."
                .to_string(),
            priority: Priority::High,
            date: now,
        },
        NewNotification {
            title: "Course Registration".to_string(),
            content: "Spring registration opens next week. Maintain full-time status.".to_string(),
            priority: Priority::Medium,
            date: now,
        },
    ]
}

/// Passages from the F1 helper document, used as optional context for the
/// generative responder. Not part of the curated store.
pub fn reference_passages() -> Vec<NewQaEntry> {
    vec![
        NewQaEntry::new(
            "What are the requirements for maintaining F1 status?",
            "To maintain F1 status, you must: 1) Maintain a full course load, 2) Make normal \
             academic progress, 3) Not work without authorization, 4) Keep your I-20 valid and \
             passport current, 5) Maintain health insurance coverage.",
            "status_maintenance",
        ),
        NewQaEntry::new(
            "Can F1 students work off-campus?",
            "F1 students can work off-campus through: 1) Curricular Practical Training (CPT), \
             2) Optional Practical Training (OPT), or 3) Economic hardship authorization. Each \
             type requires specific eligibility criteria and authorization from USCIS or your DSO.",
            "employment",
        ),
    ]
}
