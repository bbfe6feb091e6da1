//! On-disk project fixture: `config/config.yaml` plus seven small CSVs.
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

pub const AGENCIES: [&str; 2] = ["Agency_01", "Agency_02"];
pub const SKUS: [&str; 2] = ["SKU_01", "SKU_02"];
pub const MONTHS: [i64; 3] = [201301, 201302, 201303];

/// Raw CSV bodies, one per source. Tests tweak these before `write`.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub historical_volume: String,
    pub price_sales_promotion: String,
    pub event_calendar: String,
    pub weather: String,
    pub demographics: String,
    pub industry_volume: String,
    pub industry_soda_sales: String,
}

pub struct Project {
    pub dir: TempDir,
    pub config: PathBuf,
}

impl Default for Fixture {
    fn default() -> Self {
        let mut historical_volume = String::from("Agency,SKU,YearMonth,Volume\n");
        let mut price_sales_promotion = String::from("YearMonth,Agency,SKU,Price,Sales,Promotions\n");
        for agency in AGENCIES {
            for sku in SKUS {
                for (i, month) in MONTHS.iter().enumerate() {
                    historical_volume.push_str(&format!("{agency},{sku},{month},{}.5\n", 50 + i));
                    price_sales_promotion.push_str(&format!("{month},{agency},{sku},10,400,100\n"));
                }
            }
        }

        let mut event_calendar = String::from(
            "YearMonth,Easter Day,Good Friday,New Year,Christmas,Labor Day,Independence Day,\
             Revolution Day Memorial,Regional Games ,FIFA U-17 World Cup,Football Gold Cup,Beer Capital,Music Fest\n",
        );
        for month in 1..=12 {
            let new_year = u8::from(month == 1);
            let christmas = u8::from(month == 12);
            event_calendar.push_str(&format!("2013{month:02},0,0,{new_year},{christmas},0,0,0,0,0,0,1,0\n"));
        }

        let mut weather = String::from("YearMonth,Agency,Avg_Max_Temp\n");
        for agency in AGENCIES {
            for (i, month) in MONTHS.iter().enumerate() {
                weather.push_str(&format!("{month},{agency},{}\n", 17.25 + 5.0 * i as f64));
            }
        }

        let mut demographics = String::from("Agency,Avg_Population_2017,Avg_Yearly_Household_Income_2017\n");
        for (i, population) in [1_500_000, 1_800_000, 2_200_000, 3_000_000, 900_000].iter().enumerate() {
            demographics.push_str(&format!("Agency_{:02},{population},{}\n", i + 1, 100_000 + 20_000 * i));
        }

        let mut industry_volume = String::from("YearMonth,Industry_Volume\n");
        let mut industry_soda_sales = String::from("YearMonth,Soda_Volume\n");
        for i in 0..14 {
            let month = if i < 12 { 201301 + i } else { 201401 + (i - 12) };
            industry_volume.push_str(&format!("{month},{}\n", 1_000_000 + 10_000 * i));
            industry_soda_sales.push_str(&format!("{month},{}\n", 500_000 + 5_000 * i));
        }

        Self {
            historical_volume,
            price_sales_promotion,
            event_calendar,
            weather,
            demographics,
            industry_volume,
            industry_soda_sales,
        }
    }
}

impl Fixture {
    /// Write `config/config.yaml` and `data/*.csv` into a fresh temp dir.
    pub fn write(&self) -> Project {
        let dir = tempfile::tempdir().expect("create temp dir");
        let data = dir.path().join("data");
        let config_dir = dir.path().join("config");
        fs::create_dir_all(&data).expect("create data dir");
        fs::create_dir_all(&config_dir).expect("create config dir");

        let files = [
            ("historical_volume.csv", &self.historical_volume),
            ("price_sales_promotion.csv", &self.price_sales_promotion),
            ("event_calendar.csv", &self.event_calendar),
            ("weather.csv", &self.weather),
            ("demographics.csv", &self.demographics),
            ("industry_volume.csv", &self.industry_volume),
            ("industry_soda_sales.csv", &self.industry_soda_sales),
        ];
        for (name, body) in files {
            fs::write(data.join(name), body).expect("write fixture csv");
        }

        let config = config_dir.join("config.yaml");
        fs::write(
            &config,
            "data_source:\n\
             \x20 demographics: data/demographics.csv\n\
             \x20 event_calendar: data/event_calendar.csv\n\
             \x20 historical_volume: data/historical_volume.csv\n\
             \x20 prices_sales_promotions: data/price_sales_promotion.csv\n\
             \x20 industry_soda_sales: data/industry_soda_sales.csv\n\
             \x20 weather: data/weather.csv\n\
             \x20 industry+volume: data/industry_volume.csv\n",
        )
        .expect("write config");

        Project { dir, config }
    }
}

/// Drop every line of `csv` containing all of `needles`.
pub fn without_lines(csv: &str, needles: &[&str]) -> String {
    csv.lines()
        .filter(|line| !needles.iter().all(|n| line.contains(n)))
        .map(|line| format!("{line}\n"))
        .collect()
}
