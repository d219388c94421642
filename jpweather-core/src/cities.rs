//! Prefectural capitals offered in the location selector.

use crate::model::{Coordinate, Location};

/// A picked point within this many degrees of a city snaps to it.
pub const SNAP_TOLERANCE_DEG: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub label: &'static str,
    pub coordinate: Coordinate,
}

impl City {
    const fn new(name: &'static str, label: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, label, coordinate: Coordinate::new(lat, lng) }
    }

    pub fn location(&self) -> Location {
        Location {
            name: self.name.to_string(),
            label: self.label.to_string(),
            coordinate: self.coordinate,
        }
    }
}

/// In prefecture order, Hokkaido first.
pub const JAPANESE_CITIES: [City; 47] = [
    City::new("Sapporo", "札幌 (北海道)", 43.0642, 141.3469),
    City::new("Aomori", "青森 (青森県)", 40.8246, 140.7406),
    City::new("Morioka", "盛岡 (岩手県)", 39.7036, 141.1527),
    City::new("Sendai", "仙台 (宮城県)", 38.2682, 140.8694),
    City::new("Akita", "秋田 (秋田県)", 39.7186, 140.1024),
    City::new("Yamagata", "山形 (山形県)", 38.2404, 140.3633),
    City::new("Fukushima", "福島 (福島県)", 37.7503, 140.4676),
    City::new("Mito", "水戸 (茨城県)", 36.3418, 140.4468),
    City::new("Utsunomiya", "宇都宮 (栃木県)", 36.5658, 139.8836),
    City::new("Maebashi", "前橋 (群馬県)", 36.3912, 139.0609),
    City::new("Saitama", "さいたま (埼玉県)", 35.8569, 139.6489),
    City::new("Chiba", "千葉 (千葉県)", 35.6047, 140.1233),
    City::new("Tokyo", "東京 (東京都)", 35.6895, 139.6917),
    City::new("Yokohama", "横浜 (神奈川県)", 35.4478, 139.6425),
    City::new("Niigata", "新潟 (新潟県)", 37.9026, 139.0236),
    City::new("Toyama", "富山 (富山県)", 36.6953, 137.2113),
    City::new("Kanazawa", "金沢 (石川県)", 36.5947, 136.6256),
    City::new("Fukui", "福井 (福井県)", 36.0652, 136.2216),
    City::new("Kofu", "甲府 (山梨県)", 35.6642, 138.5684),
    City::new("Nagano", "長野 (長野県)", 36.6513, 138.1810),
    City::new("Gifu", "岐阜 (岐阜県)", 35.3912, 136.7223),
    City::new("Shizuoka", "静岡 (静岡県)", 34.9769, 138.3831),
    City::new("Nagoya", "名古屋 (愛知県)", 35.1815, 136.9066),
    City::new("Tsu", "津 (三重県)", 34.7303, 136.5086),
    City::new("Otsu", "大津 (滋賀県)", 35.0045, 135.8686),
    City::new("Kyoto", "京都 (京都府)", 35.0116, 135.7681),
    City::new("Osaka", "大阪 (大阪府)", 34.6937, 135.5023),
    City::new("Kobe", "神戸 (兵庫県)", 34.6901, 135.1955),
    City::new("Nara", "奈良 (奈良県)", 34.6851, 135.8048),
    City::new("Wakayama", "和歌山 (和歌山県)", 34.2261, 135.1675),
    City::new("Tottori", "鳥取 (鳥取県)", 35.5011, 134.2351),
    City::new("Matsue", "松江 (島根県)", 35.4723, 133.0505),
    City::new("Okayama", "岡山 (岡山県)", 34.6618, 133.9344),
    City::new("Hiroshima", "広島 (広島県)", 34.3853, 132.4553),
    City::new("Yamaguchi", "山口 (山口県)", 34.1859, 131.4714),
    City::new("Tokushima", "徳島 (徳島県)", 34.0658, 134.5593),
    City::new("Takamatsu", "高松 (香川県)", 34.3401, 134.0434),
    City::new("Matsuyama", "松山 (愛媛県)", 33.8416, 132.7657),
    City::new("Kochi", "高知 (高知県)", 33.5597, 133.5311),
    City::new("Fukuoka", "福岡 (福岡県)", 33.5904, 130.4017),
    City::new("Saga", "佐賀 (佐賀県)", 33.2494, 130.2988),
    City::new("Nagasaki", "長崎 (長崎県)", 32.7503, 129.8779),
    City::new("Kumamoto", "熊本 (熊本県)", 32.8031, 130.7079),
    City::new("Oita", "大分 (大分県)", 33.2382, 131.6126),
    City::new("Miyazaki", "宮崎 (宮崎県)", 31.9077, 131.4202),
    City::new("Kagoshima", "鹿児島 (鹿児島県)", 31.5966, 130.5571),
    City::new("Naha", "那覇 (沖縄県)", 26.2124, 127.6809),
];

pub const DEFAULT_CITY_INDEX: usize = 12;

pub fn default_city() -> &'static City {
    &JAPANESE_CITIES[DEFAULT_CITY_INDEX]
}

/// Look a city up by romanized name (any case) or by its exact label.
pub fn find_city(query: &str) -> Option<&'static City> {
    let query = query.trim();
    JAPANESE_CITIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(query) || c.label == query)
}

/// First city close enough to `coordinate` to snap to.
pub fn nearby_city(coordinate: &Coordinate) -> Option<&'static City> {
    JAPANESE_CITIES
        .iter()
        .find(|c| c.coordinate.is_near(coordinate, SNAP_TOLERANCE_DEG))
}

impl Location {
    /// Name a picked point after a nearby city, or keep it as a custom point.
    /// The picked coordinate is kept either way.
    pub fn resolve(coordinate: Coordinate) -> Location {
        match nearby_city(&coordinate) {
            Some(city) => Location { coordinate, ..city.location() },
            None => Location::custom(coordinate),
        }
    }
}
