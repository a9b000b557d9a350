use serde::{Deserialize, Serialize};

/// Transaction kind for a property listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Rent,
    Sale,
}

impl PropertyKind {
    pub fn badge(&self) -> &'static str {
        match self {
            PropertyKind::Rent => "EN RENTA",
            PropertyKind::Sale => "EN VENTA",
        }
    }
}

/// A catalog listing. The price is a pre-formatted display string; the
/// currency and unit are baked into the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub kind: PropertyKind,
    pub image: String,
    pub beds: u8,
    pub baths: f32,
    pub sqm: u32,
    pub has_tour: bool,
    pub description: Option<String>,
    pub amenities: Vec<String>,
}

/// Filter over the transaction kind of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    All,
    Rent,
    Sale,
}

impl SearchMode {
    pub fn all() -> [SearchMode; 3] {
        [SearchMode::All, SearchMode::Rent, SearchMode::Sale]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchMode::All => "Todo",
            SearchMode::Rent => "Renta",
            SearchMode::Sale => "Venta",
        }
    }

    pub fn next(&self) -> SearchMode {
        match self {
            SearchMode::All => SearchMode::Rent,
            SearchMode::Rent => SearchMode::Sale,
            SearchMode::Sale => SearchMode::All,
        }
    }

    fn matches(&self, kind: PropertyKind) -> bool {
        match self {
            SearchMode::All => true,
            SearchMode::Rent => kind == PropertyKind::Rent,
            SearchMode::Sale => kind == PropertyKind::Sale,
        }
    }
}

pub struct ListingDb {
    properties: Vec<Property>,
}

impl ListingDb {
    /// The built-in catalog. Listings are load-time only; there is no
    /// create/update/delete.
    pub fn sample() -> Self {
        Self {
            properties: sample_properties(),
        }
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Ordered subsequence of listings whose kind matches the mode and whose
    /// title or location contains the query (case-insensitive). An empty
    /// query matches every kind-matching listing.
    pub fn filter(&self, mode: SearchMode, query: &str) -> Vec<&Property> {
        let query = query.to_lowercase();

        self.properties
            .iter()
            .filter(|p| {
                mode.matches(p.kind)
                    && (p.title.to_lowercase().contains(&query)
                        || p.location.to_lowercase().contains(&query))
            })
            .collect()
    }
}

fn sample_properties() -> Vec<Property> {
    vec![
        Property {
            id: "1".to_string(),
            title: "Loft Moderno Centro".to_string(),
            price: "$24,000 MXN".to_string(),
            location: "Centro Histórico, CDMX".to_string(),
            kind: PropertyKind::Rent,
            image: "https://images.unsplash.com/photo-1502672260266-1c1ef2d93688?q=80&w=1200&auto=format&fit=crop".to_string(),
            beds: 1,
            baths: 1.0,
            sqm: 85,
            has_tour: true,
            description: Some("Espacio industrial reconvertido con acabados de concreto pulido e iluminación inteligente Lutron. Ideal para nómadas digitales que buscan inspiración en el corazón de la ciudad. Aislamiento acústico de grado estudio.".to_string()),
            amenities: vec![
                "Smart Home".to_string(),
                "Seguridad 24/7".to_string(),
                "Gym".to_string(),
                "Coworking".to_string(),
                "Internet Fibra Óptica".to_string(),
            ],
        },
        Property {
            id: "2".to_string(),
            title: "Penthouse Skyline".to_string(),
            price: "$12.5 MDP".to_string(),
            location: "Santa Fe, CDMX".to_string(),
            kind: PropertyKind::Sale,
            image: "https://images.unsplash.com/photo-1512918760513-95f6929c3c38?q=80&w=1200&auto=format&fit=crop".to_string(),
            beds: 3,
            baths: 3.5,
            sqm: 240,
            has_tour: true,
            description: Some("Vistas panorámicas de 360 grados sobre el distrito financiero. Acabados en mármol negro Monterrey y madera de nogal. Sistema de domótica completo controlado por voz y acceso biométrico directo al elevador.".to_string()),
            amenities: vec![
                "Alberca Infinita".to_string(),
                "Helipuerto".to_string(),
                "Spa Privado".to_string(),
                "Cine en Casa".to_string(),
                "Concierge".to_string(),
            ],
        },
        Property {
            id: "3".to_string(),
            title: "Estudio Industrial".to_string(),
            price: "$18,500 MXN".to_string(),
            location: "Roma Norte, CDMX".to_string(),
            kind: PropertyKind::Rent,
            image: "https://images.unsplash.com/photo-1536376072261-38c75010e6c9?q=80&w=1200&auto=format&fit=crop".to_string(),
            beds: 1,
            baths: 1.0,
            sqm: 65,
            has_tour: false,
            description: Some("Minimalismo puro en la zona más vibrante de la ciudad. Doble altura, ventanales de piso a techo y una cocina de chef compacta con electrodomésticos Smeg negros. Perfecto para un estilo de vida urbano y dinámico.".to_string()),
            amenities: vec![
                "Roof Garden Común".to_string(),
                "Bicipuerto".to_string(),
                "Pet Friendly".to_string(),
                "Seguridad CCTV".to_string(),
            ],
        },
        Property {
            id: "4".to_string(),
            title: "Residencia Bosques".to_string(),
            price: "$28 MDP".to_string(),
            location: "Bosques de las Lomas".to_string(),
            kind: PropertyKind::Sale,
            image: "https://images.unsplash.com/photo-1600596542815-e495d9159fb2?q=80&w=1200&auto=format&fit=crop".to_string(),
            beds: 4,
            baths: 5.0,
            sqm: 520,
            has_tour: true,
            description: Some("Arquitectura brutalista contemporánea rodeada de naturaleza. Espacios abiertos que fluyen hacia el jardín zen privado. Cuenta con paneles solares, captación pluvial y cargadores para vehículos eléctricos.".to_string()),
            amenities: vec![
                "Jardín Privado".to_string(),
                "Cava de Vinos".to_string(),
                "Paneles Solares".to_string(),
                "Cuarto de Servicio".to_string(),
                "Seguridad Armada".to_string(),
            ],
        },
        Property {
            id: "5".to_string(),
            title: "Casa Familiar Valle".to_string(),
            price: "$8.5 MDP".to_string(),
            location: "Del Valle, CDMX".to_string(),
            kind: PropertyKind::Sale,
            image: "https://images.unsplash.com/photo-1564013799919-ab600027ffc6?q=80&w=1200&auto=format&fit=crop".to_string(),
            beds: 3,
            baths: 3.0,
            sqm: 280,
            has_tour: true,
            description: Some("El equilibrio perfecto entre diseño moderno y calidez familiar. Recién remodelada con pisos de ingeniería y cocina de cuarzo. Ubicación estratégica cerca de los mejores colegios y parques de la zona.".to_string()),
            amenities: vec![
                "2 Estacionamientos".to_string(),
                "Family Room".to_string(),
                "Bodega".to_string(),
                "Circuito Cerrado".to_string(),
                "Terraza".to_string(),
            ],
        },
        Property {
            id: "6".to_string(),
            title: "Apartamento Polanco".to_string(),
            price: "$45,000 MXN".to_string(),
            location: "Polanco V Sección".to_string(),
            kind: PropertyKind::Rent,
            image: "https://images.unsplash.com/photo-1522708323590-d24dbb6b0267?q=80&w=1200&auto=format&fit=crop".to_string(),
            beds: 2,
            baths: 2.0,
            sqm: 110,
            has_tour: false,
            description: Some("Lujo discreto a pasos de Masaryk. Interiorismo de autor, totalmente amueblado con piezas de diseño. Incluye servicio de limpieza y mantenimiento. Listo para habitar inmediatamente.".to_string()),
            amenities: vec![
                "Amueblado".to_string(),
                "Valet Parking".to_string(),
                "Gimnasio".to_string(),
                "Business Center".to_string(),
                "Aire Acondicionado".to_string(),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_matches_everything() {
        let db = ListingDb::sample();
        assert_eq!(db.filter(SearchMode::All, "").len(), db.len());
    }

    #[test]
    fn test_mode_filters_by_kind() {
        let db = ListingDb::sample();
        let rentals = db.filter(SearchMode::Rent, "");
        assert!(!rentals.is_empty());
        assert!(rentals.iter().all(|p| p.kind == PropertyKind::Rent));

        let sales = db.filter(SearchMode::Sale, "");
        assert!(!sales.is_empty());
        assert!(sales.iter().all(|p| p.kind == PropertyKind::Sale));

        assert_eq!(rentals.len() + sales.len(), db.len());
    }

    #[test]
    fn test_query_matches_title_or_location_case_insensitive() {
        let db = ListingDb::sample();

        let by_title = db.filter(SearchMode::All, "LOFT");
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Loft Moderno Centro");

        let by_location = db.filter(SearchMode::All, "polanco");
        assert_eq!(by_location.len(), 1);
        assert_eq!(by_location[0].location, "Polanco V Sección");
    }

    #[test]
    fn test_mode_and_query_combine() {
        // mode=rent, query="roma" -> the single Roma Norte rental
        let db = ListingDb::sample();
        let results = db.filter(SearchMode::Rent, "roma");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location, "Roma Norte, CDMX");
        assert_eq!(results[0].kind, PropertyKind::Rent);
    }

    #[test]
    fn test_query_cdmx_matches_regardless_of_kind() {
        let db = ListingDb::sample();
        let results = db.filter(SearchMode::All, "cdmx");
        assert_eq!(results.len(), 4);
        assert!(results
            .iter()
            .all(|p| p.location.to_lowercase().contains("cdmx")));
    }

    #[test]
    fn test_no_results_is_a_valid_state() {
        let db = ListingDb::sample();
        assert!(db.filter(SearchMode::All, "guadalajara").is_empty());
    }

    #[test]
    fn test_filter_preserves_catalog_order() {
        let db = ListingDb::sample();
        let results = db.filter(SearchMode::Sale, "");
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "5"]);
    }

    #[test]
    fn test_reset_yields_full_collection() {
        let db = ListingDb::sample();
        let narrowed = db.filter(SearchMode::Rent, "roma");
        assert_eq!(narrowed.len(), 1);
        // Clearing the query and returning the mode to All restores everything
        assert_eq!(
            db.filter(SearchMode::default(), "").len(),
            db.len()
        );
    }
}
