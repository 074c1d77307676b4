use std::collections::HashMap;

use serde::Serialize;

use crate::core::Plan;

/// Immutable reference data for one orderable vehicle. Monthly rates are
/// carried per plan even though the published price list currently quotes
/// the same figure for both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleModel {
    pub id: String,
    pub maker: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    pub monthly_j7: i64,
    pub monthly_j9: i64,
    pub full_price: i64,
    pub detail_url: String,
    pub image_url: String,
}

impl VehicleModel {
    pub fn monthly_rate(&self, plan: Plan) -> i64 {
        match plan {
            Plan::JSeven => self.monthly_j7,
            Plan::JNine => self.monthly_j9,
        }
    }
}

/// Keyed read-only view over the model list, built once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Vec<VehicleModel>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_models(models: Vec<VehicleModel>) -> Self {
        let index = models
            .iter()
            .enumerate()
            .map(|(idx, model)| (model.id.clone(), idx))
            .collect();
        Self { models, index }
    }

    pub fn builtin() -> Self {
        Self::from_models(builtin_models())
    }

    pub fn lookup(&self, id: &str) -> Option<&VehicleModel> {
        self.index.get(id).map(|&idx| &self.models[idx])
    }

    pub fn models(&self) -> &[VehicleModel] {
        &self.models
    }
}

fn model(
    id: &str,
    maker: &str,
    name: &str,
    grade: Option<&str>,
    seats: Option<u32>,
    monthly: i64,
    full_price: i64,
    detail_url: &str,
    image_url: &str,
) -> VehicleModel {
    VehicleModel {
        id: id.to_string(),
        maker: maker.to_string(),
        name: name.to_string(),
        grade: grade.map(str::to_string),
        seats,
        monthly_j7: monthly,
        monthly_j9: monthly,
        full_price,
        detail_url: detail_url.to_string(),
        image_url: image_url.to_string(),
    }
}

fn builtin_models() -> Vec<VehicleModel> {
    vec![
        model(
            "wgnr",
            "Suzuki",
            "Wagon R",
            Some("HYBRID FX-S"),
            Some(4),
            26_950,
            1_330_000,
            "https://www.jams-cars.jp/car_details/?g=5&id=81350",
            "/cars/suzuki/wagon-r.jpg",
        ),
        model(
            "tanto",
            "Daihatsu",
            "Tanto",
            Some("X"),
            Some(4),
            29_480,
            1_470_000,
            "https://www.jams-cars.jp/car_details/?g=5&id=82950",
            "/cars/daihatsu/tanto.jpg",
        ),
        model(
            "wgnrsmile",
            "Suzuki",
            "Wagon R Smile",
            Some("HYBRID S"),
            Some(4),
            31_680,
            1_561_000,
            "https://www.jams-cars.jp/car_details/?g=5&id=82264",
            "/cars/suzuki/wagon-r-smile.jpg",
        ),
        model(
            "nbox",
            "Honda",
            "N-BOX",
            None,
            Some(4),
            32_340,
            1_581_000,
            "https://www.jams-cars.jp/car_details/?g=5&id=81437",
            "/cars/honda/n-box.jpg",
        ),
        model(
            "spacia-custom",
            "Suzuki",
            "Spacia Custom",
            Some("HYBRID GS"),
            Some(4),
            32_780,
            1_638_000,
            "https://www.jams-cars.jp/car_details/?g=5&id=82010",
            "/cars/suzuki/spacia-custom.jpg",
        ),
        model(
            "every-wagon",
            "Suzuki",
            "Every Wagon",
            Some("PZ Turbo"),
            Some(4),
            33_550,
            1_671_000,
            "https://www.jams-cars.jp/car_details/?g=5&id=81234",
            "/cars/suzuki/every-wagon.jpg",
        ),
        model(
            "swift-mx-2",
            "Suzuki",
            "Swift",
            Some("HYBRID MX"),
            Some(5),
            38_060,
            1_748_000,
            "https://www.jams-cars.jp/car_details/?g=5&id=83002",
            "/cars/suzuki/swift.jpg",
        ),
        model(
            "freed-air-ex",
            "Honda",
            "Freed",
            Some("AIR EX 6-seater"),
            Some(6),
            53_020,
            2_557_000,
            "https://www.jams-cars.jp/car_details/?g=5&id=82555",
            "/cars/honda/freed.jpg",
        ),
        model(
            "prius-g",
            "Toyota",
            "Prius",
            Some("G (hybrid)"),
            Some(5),
            58_080,
            2_952_091,
            "https://www.jams-cars.jp/car_details/?g=5&id=82888",
            "/cars/toyota/prius.jpg",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = Catalog::builtin();
        let ids: HashSet<&str> = catalog.models().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.models().len());
    }

    #[test]
    fn lookup_hits_and_misses() {
        let catalog = Catalog::builtin();
        let wagon_r = catalog.lookup("wgnr").expect("known model");
        assert_eq!(wagon_r.maker, "Suzuki");
        assert_eq!(wagon_r.full_price, 1_330_000);
        assert!(catalog.lookup("no-such-model").is_none());
    }

    #[test]
    fn prices_and_rates_are_positive_for_both_plans() {
        let catalog = Catalog::builtin();
        for model in catalog.models() {
            assert!(model.full_price > 0, "{} price", model.id);
            assert!(model.monthly_rate(Plan::JSeven) > 0, "{} j7 rate", model.id);
            assert!(model.monthly_rate(Plan::JNine) > 0, "{} j9 rate", model.id);
        }
    }
}
