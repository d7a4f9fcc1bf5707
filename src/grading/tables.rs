// src/grading/tables.rs

//! 2023 WMA age factor tables.
//!
//! One entry per age from 30 through 100 inclusive, transcribed from the
//! published WMA 2023 road tables. 10-mile factors are not published
//! separately and are interpolated in the engine from the 10K and half
//! marathon columns.

/// Youngest age with its own table entry; younger athletes clamp here.
pub(super) const MIN_AGE: u32 = 30;
/// Oldest age with its own table entry; older athletes clamp here.
pub(super) const MAX_AGE: u32 = 100;

pub(super) const FEMALE_5K: [f64; 71] = [
    1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 0.9974,
    0.9904, 0.9833, 0.9761, 0.9689, 0.9615, 0.9541,
    0.9467, 0.9392, 0.9316, 0.9239, 0.9162, 0.9084,
    0.9006, 0.8926, 0.8847, 0.8766, 0.8685, 0.8603,
    0.8521, 0.8438, 0.8355, 0.8271, 0.8186, 0.8101,
    0.8015, 0.7929, 0.7842, 0.7755, 0.7667, 0.7578,
    0.7489, 0.7399, 0.7309, 0.7219, 0.7128, 0.7036,
    0.6944, 0.6851, 0.6758, 0.6665, 0.6571, 0.6476,
    0.6381, 0.6286, 0.6190, 0.6094, 0.5997, 0.5893,
    0.5783, 0.5665, 0.5541, 0.5410, 0.5272, 0.5127,
    0.4975, 0.4816, 0.4650, 0.4478, 0.4299, 0.4112,
    0.3919, 0.3719, 0.3513, 0.3299, 0.3079,
];

pub(super) const FEMALE_10K: [f64; 71] = [
    1.0000, 1.0000, 1.0000, 1.0000, 0.9937, 0.9869,
    0.9801, 0.9731, 0.9661, 0.9591, 0.9519, 0.9447,
    0.9374, 0.9301, 0.9227, 0.9152, 0.9077, 0.9001,
    0.8925, 0.8848, 0.8770, 0.8692, 0.8613, 0.8533,
    0.8453, 0.8373, 0.8291, 0.8210, 0.8127, 0.8045,
    0.7961, 0.7877, 0.7793, 0.7708, 0.7623, 0.7537,
    0.7450, 0.7363, 0.7276, 0.7188, 0.7100, 0.7011,
    0.6922, 0.6832, 0.6742, 0.6651, 0.6560, 0.6468,
    0.6376, 0.6284, 0.6191, 0.6098, 0.6004, 0.5903,
    0.5795, 0.5679, 0.5556, 0.5425, 0.5287, 0.5142,
    0.4990, 0.4830, 0.4662, 0.4488, 0.4306, 0.4116,
    0.3920, 0.3716, 0.3505, 0.3286, 0.3060,
];

pub(super) const FEMALE_HALF: [f64; 71] = [
    1.0000, 1.0000, 1.0000, 0.9935, 0.9869, 0.9802,
    0.9734, 0.9666, 0.9596, 0.9526, 0.9455, 0.9384,
    0.9311, 0.9238, 0.9164, 0.9090, 0.9014, 0.8938,
    0.8862, 0.8784, 0.8706, 0.8627, 0.8548, 0.8468,
    0.8387, 0.8306, 0.8224, 0.8141, 0.8058, 0.7974,
    0.7889, 0.7804, 0.7718, 0.7632, 0.7545, 0.7457,
    0.7369, 0.7280, 0.7191, 0.7101, 0.7011, 0.6920,
    0.6828, 0.6736, 0.6644, 0.6551, 0.6457, 0.6363,
    0.6268, 0.6173, 0.6078, 0.5982, 0.5879, 0.5769,
    0.5653, 0.5530, 0.5401, 0.5265, 0.5122, 0.4972,
    0.4816, 0.4653, 0.4484, 0.4307, 0.4125, 0.3935,
    0.3739, 0.3536, 0.3327, 0.3111, 0.2888,
];

pub(super) const FEMALE_MARATHON: [f64; 71] = [
    1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 0.9982,
    0.9918, 0.9854, 0.9789, 0.9722, 0.9654, 0.9585,
    0.9515, 0.9444, 0.9371, 0.9298, 0.9223, 0.9148,
    0.9071, 0.8993, 0.8915, 0.8835, 0.8754, 0.8672,
    0.8590, 0.8506, 0.8421, 0.8336, 0.8249, 0.8162,
    0.8073, 0.7984, 0.7894, 0.7803, 0.7711, 0.7618,
    0.7524, 0.7430, 0.7335, 0.7239, 0.7142, 0.7044,
    0.6946, 0.6846, 0.6746, 0.6646, 0.6544, 0.6442,
    0.6339, 0.6235, 0.6131, 0.6025, 0.5914, 0.5795,
    0.5670, 0.5538, 0.5400, 0.5254, 0.5103, 0.4944,
    0.4779, 0.4608, 0.4429, 0.4245, 0.4053, 0.3855,
    0.3651, 0.3439, 0.3222, 0.2997, 0.2767,
];

pub(super) const MALE_5K: [f64; 71] = [
    1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000,
    1.0000, 0.9943, 0.9863, 0.9782, 0.9701, 0.9621,
    0.9540, 0.9460, 0.9380, 0.9299, 0.9219, 0.9139,
    0.9059, 0.8980, 0.8900, 0.8820, 0.8740, 0.8661,
    0.8582, 0.8502, 0.8423, 0.8344, 0.8265, 0.8185,
    0.8106, 0.8028, 0.7949, 0.7870, 0.7791, 0.7713,
    0.7634, 0.7556, 0.7477, 0.7399, 0.7321, 0.7242,
    0.7164, 0.7086, 0.7008, 0.6930, 0.6852, 0.6775,
    0.6697, 0.6619, 0.6541, 0.6456, 0.6362, 0.6261,
    0.6151, 0.6034, 0.5908, 0.5775, 0.5633, 0.5484,
    0.5326, 0.5161, 0.4987, 0.4806, 0.4617, 0.4419,
    0.4214, 0.4000, 0.3779, 0.3550, 0.3313,
];

pub(super) const MALE_10K: [f64; 71] = [
    1.0000, 1.0000, 1.0000, 1.0000, 0.9973, 0.9897,
    0.9822, 0.9747, 0.9672, 0.9597, 0.9523, 0.9449,
    0.9375, 0.9301, 0.9228, 0.9155, 0.9082, 0.9009,
    0.8937, 0.8865, 0.8793, 0.8722, 0.8650, 0.8579,
    0.8509, 0.8438, 0.8368, 0.8298, 0.8228, 0.8158,
    0.8089, 0.8019, 0.7950, 0.7882, 0.7813, 0.7745,
    0.7677, 0.7609, 0.7541, 0.7474, 0.7407, 0.7340,
    0.7273, 0.7206, 0.7140, 0.7073, 0.7007, 0.6942,
    0.6868, 0.6787, 0.6698, 0.6601, 0.6496, 0.6383,
    0.6263, 0.6135, 0.5999, 0.5856, 0.5704, 0.5545,
    0.5378, 0.5203, 0.5021, 0.4830, 0.4632, 0.4426,
    0.4213, 0.3991, 0.3762, 0.3524, 0.3279,
];

pub(super) const MALE_HALF: [f64; 71] = [
    1.0000, 1.0000, 1.0000, 1.0000, 0.9970, 0.9914,
    0.9857, 0.9800, 0.9742, 0.9683, 0.9624, 0.9564,
    0.9503, 0.9442, 0.9380, 0.9317, 0.9254, 0.9190,
    0.9126, 0.9061, 0.8996, 0.8930, 0.8864, 0.8797,
    0.8730, 0.8662, 0.8594, 0.8526, 0.8457, 0.8387,
    0.8317, 0.8247, 0.8176, 0.8105, 0.8034, 0.7962,
    0.7890, 0.7818, 0.7745, 0.7672, 0.7600, 0.7534,
    0.7468, 0.7396, 0.7318, 0.7233, 0.7142, 0.7044,
    0.6941, 0.6831, 0.6715, 0.6592, 0.6463, 0.6328,
    0.6187, 0.6039, 0.5885, 0.5725, 0.5558, 0.5385,
    0.5206, 0.5021, 0.4829, 0.4631, 0.4426, 0.4216,
    0.3999, 0.3776, 0.3546, 0.3310, 0.3068,
];

pub(super) const MALE_MARATHON: [f64; 71] = [
    1.0000, 1.0000, 1.0000, 1.0000, 1.0000, 1.0000,
    1.0000, 1.0000, 0.9947, 0.9876, 0.9804, 0.9733,
    0.9661, 0.9589, 0.9517, 0.9445, 0.9372, 0.9299,
    0.9226, 0.9153, 0.9079, 0.9005, 0.8931, 0.8857,
    0.8783, 0.8708, 0.8633, 0.8558, 0.8483, 0.8407,
    0.8331, 0.8255, 0.8179, 0.8103, 0.8026, 0.7950,
    0.7873, 0.7796, 0.7718, 0.7641, 0.7563, 0.7485,
    0.7407, 0.7329, 0.7250, 0.7165, 0.7074, 0.6976,
    0.6871, 0.6760, 0.6643, 0.6519, 0.6388, 0.6251,
    0.6108, 0.5958, 0.5801, 0.5638, 0.5469, 0.5293,
    0.5110, 0.4921, 0.4726, 0.4524, 0.4316, 0.4101,
    0.3879, 0.3651, 0.3417, 0.3176, 0.2929,
];
