//! Static, read-only catalog: curated resources, audio-book summaries and the
//! hospital directory.

use once_cell::sync::Lazy;

use super::internal::{Doctor, Hospital, ResourceKind, Service, WellnessResource};

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400.png";

fn resource(
    id: &str,
    title: &str,
    description: &str,
    category: &str,
    kind: ResourceKind,
) -> WellnessResource {
    WellnessResource {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        image_url: PLACEHOLDER_IMAGE.to_string(),
        category: category.to_string(),
        kind,
    }
}

fn article(duration: &str, markdown: &str) -> ResourceKind {
    ResourceKind::Article {
        content_url: Some("#".to_string()),
        duration: Some(duration.to_string()),
        content_markdown: Some(markdown.trim().to_string()),
    }
}

fn audio(duration: &str) -> ResourceKind {
    ResourceKind::Audio {
        content_url: Some("#".to_string()),
        duration: Some(duration.to_string()),
    }
}

pub static CURATED_RESOURCES: Lazy<Vec<WellnessResource>> = Lazy::new(|| {
    vec![
        resource(
            "CWR001",
            "Beginner's Guide to Meditation",
            "Learn the basics of meditation and start your journey to inner peace.",
            "Mindfulness",
            article(
                "10 min read",
                r#"
# A Beginner's Guide to Meditation

Meditation trains attention and awareness to reach a clear and calm state.

## Simple Meditation Exercise

1. Find a quiet place and sit comfortably.
2. Close your eyes and breathe naturally.
3. When your mind wanders, gently return to the breath.
4. Start with 5-10 minutes a day.
"#,
            ),
        ),
        resource(
            "CWR002",
            "10 Quick & Healthy Breakfast Ideas",
            "Fuel your day with these easy and nutritious breakfast recipes.",
            "Nutrition",
            article(
                "15 min read",
                r#"
# 10 Quick & Healthy Breakfast Ideas

Overnight oats, avocado toast, Greek yogurt with berries, smoothies,
scrambled eggs with spinach, fruit with cottage cheese, whole-wheat muffins,
quinoa porridge, mini breakfast burritos, and hard-boiled eggs with an apple.
"#,
            ),
        ),
        resource(
            "CWR003",
            "Morning Yoga Flow for Energy",
            "A 15-minute yoga routine to energize your body and mind.",
            "Fitness",
            ResourceKind::Video {
                content_url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
                duration: Some("15 min video".to_string()),
                youtube_video_id: Some("dQw4w9WgXcQ".to_string()),
            },
        ),
        resource(
            "CWR004",
            "The Importance of Sleep for Wellbeing",
            "Discover how quality sleep impacts your overall health and tips for better sleep.",
            "Lifestyle",
            article(
                "12 min read",
                r#"
# The Importance of Sleep for Wellbeing

Quality sleep protects mental health, physical health and daytime safety.

## Tips for Better Sleep

* Stick to a sleep schedule.
* Create a restful environment.
* Limit daytime naps.
* Manage worries.
"#,
            ),
        ),
        resource(
            "CWR005",
            "Guided Deep Breathing Exercise",
            "A short audio guide to practice deep breathing for stress relief.",
            "Mindfulness",
            audio("5 min audio"),
        ),
        resource(
            "CWR006",
            "Understanding Hydration",
            "Learn why water is crucial for your body and how to stay properly hydrated.",
            "Nutrition",
            article(
                "8 min read",
                r#"
# Understanding Hydration

Water regulates body temperature, transports nutrients, flushes waste and
lubricates joints. Watch for dark urine, dry mouth, fatigue and headaches.
"#,
            ),
        ),
    ]
});

pub static AUDIO_BOOK_SUMMARIES: Lazy<Vec<WellnessResource>> = Lazy::new(|| {
    vec![
        resource(
            "ABS001",
            "Atomic Habits by James Clear",
            "An easy and proven way to build good habits and break bad ones.",
            "Self-Improvement",
            audio("20 min audio"),
        ),
        resource(
            "ABS002",
            "Thinking, Fast and Slow by Daniel Kahneman",
            "Explore the two systems that drive the way we think.",
            "Psychology",
            audio("25 min audio"),
        ),
        resource(
            "ABS003",
            "Sapiens by Yuval Noah Harari",
            "A brief history of humankind, from the Stone Age to the present day.",
            "History",
            audio("30 min audio"),
        ),
        resource(
            "ABS004",
            "The Power of Now by Eckhart Tolle",
            "A guide to living in the present moment.",
            "Spirituality",
            audio("22 min audio"),
        ),
    ]
});

pub static HOSPITALS: Lazy<Vec<Hospital>> = Lazy::new(|| {
    let doctor = |id: &str, name: &str, specialty: &str| Doctor {
        id: id.to_string(),
        name: name.to_string(),
        specialty: specialty.to_string(),
    };
    let service = |id: &str, name: &str, description: &str| Service {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    };

    let carter = doctor("doc1", "Dr. Emily Carter", "Cardiology");
    let adams = doctor("doc2", "Dr. Ben Adams", "Orthopedics");
    let chen = doctor("doc3", "Dr. Olivia Chen", "Pediatrics");
    let green = doctor("doc4", "Dr. Marcus Green", "Neurology");

    let cardiology = service("serv1", "Cardiology", "Comprehensive heart care and treatment.");
    let orthopedics = service("serv2", "Orthopedics", "Musculoskeletal system treatment and surgery.");
    let pediatrics = service("serv3", "Pediatrics", "Medical care for infants, children, and adolescents.");
    let neurology = service("serv4", "Neurology", "Diagnosis and treatment of nervous system disorders.");
    let emergency = service("serv5", "Emergency Care", "24/7 emergency medical services.");
    let oncology = service("serv6", "Oncology", "Cancer diagnosis and treatment.");

    vec![
        Hospital {
            id: "hosp1".to_string(),
            name: "City General Hospital".to_string(),
            address: "123 Main St, Anytown, USA".to_string(),
            image_url: PLACEHOLDER_IMAGE.to_string(),
            services: vec![cardiology.clone(), orthopedics, emergency],
            doctors: vec![carter.clone(), adams],
            phone: Some("555-1234".to_string()),
            website: Some("https://example.com/citygeneral".to_string()),
        },
        Hospital {
            id: "hosp2".to_string(),
            name: "Green Valley Community Clinic".to_string(),
            address: "456 Oak Ave, Anytown, USA".to_string(),
            image_url: PLACEHOLDER_IMAGE.to_string(),
            services: vec![pediatrics, neurology.clone()],
            doctors: vec![chen, green.clone()],
            phone: Some("555-5678".to_string()),
            website: Some("https://example.com/greenvalley".to_string()),
        },
        Hospital {
            id: "hosp3".to_string(),
            name: "St. Luke's Medical Center".to_string(),
            address: "789 Pine Ln, Anytown, USA".to_string(),
            image_url: PLACEHOLDER_IMAGE.to_string(),
            services: vec![cardiology, neurology, oncology],
            doctors: vec![carter, green],
            phone: Some("555-9012".to_string()),
            website: Some("https://example.com/stluke".to_string()),
        },
    ]
});

/// Every catalog resource, curated entries first.
pub fn all_resources() -> impl Iterator<Item = &'static WellnessResource> {
    CURATED_RESOURCES.iter().chain(AUDIO_BOOK_SUMMARIES.iter())
}

pub fn find_resource(id: &str) -> Option<&'static WellnessResource> {
    all_resources().find(|r| r.id == id)
}

/// One line per hospital, used to ground the hospital suggestion prompt.
pub fn hospital_directory_summary() -> String {
    HOSPITALS
        .iter()
        .map(|h| {
            let services: Vec<&str> = h.services.iter().map(|s| s.name.as_str()).collect();
            let doctors: Vec<String> = h
                .doctors
                .iter()
                .map(|d| format!("{} ({})", d.name, d.specialty))
                .collect();
            format!(
                "- {}: Services - {}. Doctors - {}.",
                h.name,
                services.join(", "),
                doctors.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
