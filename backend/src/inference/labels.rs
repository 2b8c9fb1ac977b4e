/// One entry of the classifier's output layout. The index in `CLASS_LABELS`
/// is the position in the model's probability vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassLabel {
    pub name: &'static str,
    pub healthy: bool,
}

const fn disease(name: &'static str) -> ClassLabel {
    ClassLabel {
        name,
        healthy: false,
    }
}

const fn healthy(name: &'static str) -> ClassLabel {
    ClassLabel {
        name,
        healthy: true,
    }
}

pub const NUM_CLASSES: usize = 38;

pub static CLASS_LABELS: [ClassLabel; NUM_CLASSES] = [
    disease("Apple___Apple_scab"),
    disease("Apple___Black_rot"),
    disease("Apple___Cedar_apple_rust"),
    healthy("Apple___healthy"),
    healthy("Blueberry___healthy"),
    disease("Cherry_(including_sour)___Powdery_mildew"),
    healthy("Cherry_(including_sour)___healthy"),
    disease("Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot"),
    disease("Corn_(maize)___Common_rust_"),
    disease("Corn_(maize)___Northern_Leaf_Blight"),
    healthy("Corn_(maize)___healthy"),
    disease("Grape___Black_rot"),
    disease("Grape___Esca_(Black_Measles)"),
    disease("Grape___Leaf_blight_(Isariopsis_Leaf_Spot)"),
    healthy("Grape___healthy"),
    disease("Orange___Haunglongbing_(Citrus_greening)"),
    disease("Peach___Bacterial_spot"),
    healthy("Peach___healthy"),
    disease("Pepper,_bell___Bacterial_spot"),
    healthy("Pepper,_bell___healthy"),
    disease("Potato___Early_blight"),
    disease("Potato___Late_blight"),
    healthy("Potato___healthy"),
    healthy("Raspberry___healthy"),
    healthy("Soybean___healthy"),
    disease("Squash___Powdery_mildew"),
    disease("Strawberry___Leaf_scorch"),
    healthy("Strawberry___healthy"),
    disease("Tomato___Bacterial_spot"),
    disease("Tomato___Early_blight"),
    disease("Tomato___Late_blight"),
    disease("Tomato___Leaf_Mold"),
    disease("Tomato___Septoria_leaf_spot"),
    disease("Tomato___Spider_mites Two-spotted_spider_mite"),
    disease("Tomato___Target_Spot"),
    disease("Tomato___Tomato_Yellow_Leaf_Curl_Virus"),
    disease("Tomato___Tomato_mosaic_virus"),
    healthy("Tomato___healthy"),
];

pub fn label(index: usize) -> Option<&'static ClassLabel> {
    CLASS_LABELS.get(index)
}
