use serde_json::{Map, Value, json};

use crate::res::escape;

use super::Profile;

pub const SITE_NAME: &str = "Show Yourself";
const DESCRIPTION_LIMIT: usize = 160;

/// Everything that goes into the `<head>` of a profile page.
#[derive(Debug)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub og_title: String,
    pub og_description: String,
    pub url: String,
    pub image: Option<String>,
    pub schema: Value,
}

impl SeoMeta {
    pub fn for_profile(profile: &Profile, base_url: &str) -> Self {
        let experience = profile.experience.as_deref().unwrap_or("professional");
        let url = format!("{base_url}/profile/{}", profile.slug);
        let image = profile
            .profile_photo
            .as_ref()
            .map(|photo| format!("{base_url}{photo}"));

        let mut description = format!(
            "Professional profile of {}, {} with {experience} experience.",
            profile.name, profile.profession
        );
        if let Some(address) = &profile.address {
            description.push_str(&format!(" Based in {address}."));
        }

        let mut keywords = vec![profile.name.as_str(), profile.profession.as_str()];
        keywords.extend(profile.skill_list());
        keywords.push("professional profile");

        let schema = json!({
            "@context": "https://schema.org",
            "@type": "Person",
            "name": profile.name,
            "jobTitle": profile.profession,
            "email": profile.email,
            "telephone": profile.phone,
            "address": profile.address,
            "description": format!("{} with {experience} experience", profile.profession),
            "url": url,
            "image": image,
        });

        Self {
            title: format!("{} - {} | {SITE_NAME}", profile.name, profile.profession),
            description: truncate(&description, DESCRIPTION_LIMIT),
            keywords: keywords.join(", "),
            og_title: format!("{} - {}", profile.name, profile.profession),
            og_description: truncate(
                &format!("Professional {} with {experience} experience", profile.profession),
                DESCRIPTION_LIMIT,
            ),
            url,
            image,
            schema: drop_nulls(schema),
        }
    }

    pub fn render(&self) -> String {
        let mut head = String::new();
        head.push_str(&format!("<title>{}</title>\n", escape(&self.title)));
        head.push_str(&meta("name", "description", &self.description));
        head.push_str(&meta("name", "keywords", &self.keywords));
        head.push_str(&format!(
            "<link rel=\"canonical\" href=\"{}\">\n",
            escape(&self.url)
        ));

        head.push_str(&meta("property", "og:title", &self.og_title));
        head.push_str(&meta("property", "og:description", &self.og_description));
        head.push_str(&meta("property", "og:type", "profile"));
        head.push_str(&meta("property", "og:url", &self.url));
        head.push_str(&meta("property", "og:site_name", SITE_NAME));

        head.push_str(&meta("name", "twitter:card", "summary_large_image"));
        head.push_str(&meta("name", "twitter:title", &self.og_title));
        head.push_str(&meta("name", "twitter:description", &self.og_description));

        if let Some(image) = &self.image {
            head.push_str(&meta("property", "og:image", image));
            head.push_str(&meta("name", "twitter:image", image));
        }

        // "</" inside a script block would end it early
        let schema = self.schema.to_string().replace("</", "<\\/");
        head.push_str(&format!(
            "<script type=\"application/ld+json\">{schema}</script>\n"
        ));

        head
    }
}

fn meta(attribute: &str, name: &str, content: &str) -> String {
    format!(
        "<meta {attribute}=\"{name}\" content=\"{}\">\n",
        escape(content)
    )
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

fn drop_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}
